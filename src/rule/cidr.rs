//! IP CIDR normalization.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};

/// IP protocol version of a CIDR bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Guess the version of an address or CIDR from its textual form.
    pub fn of(value: &str) -> Self {
        if value.contains(':') {
            IpVersion::V6
        } else {
            IpVersion::V4
        }
    }

    /// Prefix length of a single host.
    pub fn host_prefix(&self) -> u8 {
        match self {
            IpVersion::V4 => 32,
            IpVersion::V6 => 128,
        }
    }
}

/// Turn a bare address into a single-host CIDR.
///
/// Values that already carry a `/prefix` are returned unchanged.
///
/// # Examples
/// ```
/// use rulecast::rule::{ip_to_cidr, IpVersion};
///
/// assert_eq!(ip_to_cidr("1.2.3.4", IpVersion::V4), "1.2.3.4/32");
/// assert_eq!(ip_to_cidr("1.2.3.0/24", IpVersion::V4), "1.2.3.0/24");
/// assert_eq!(ip_to_cidr("::1", IpVersion::V6), "::1/128");
/// ```
pub fn ip_to_cidr(value: &str, version: IpVersion) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        format!("{}/{}", value, version.host_prefix())
    }
}

/// Merge overlapping and adjacent networks.
///
/// Entries that do not parse as a CIDR of the requested version are kept
/// verbatim after the aggregated networks, in sorted order.
pub fn aggregate_cidrs<'a, I>(values: I, version: IpVersion) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut nets: Vec<IpNet> = Vec::new();
    let mut unparsed: Vec<String> = Vec::new();

    for value in values {
        let parsed = match version {
            IpVersion::V4 => value.parse::<Ipv4Net>().map(IpNet::V4).ok(),
            IpVersion::V6 => value.parse::<Ipv6Net>().map(IpNet::V6).ok(),
        };
        match parsed {
            Some(net) => nets.push(net),
            None => unparsed.push(value.clone()),
        }
    }

    unparsed.sort();
    unparsed.dedup();

    let mut merged: Vec<String> = IpNet::aggregate(&nets)
        .into_iter()
        .map(|net| net.to_string())
        .collect();
    merged.extend(unparsed);
    merged
}
