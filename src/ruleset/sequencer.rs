//! Ordered ingestion queue drained by a single worker thread.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

use super::rules::Rules;
use crate::Result;

/// A unit of ingestion work applied to the rule buckets.
pub(crate) type Job = Box<dyn FnOnce(&mut Rules) -> Result<()> + Send + 'static>;

/// Sequencer owns the rule buckets while ingestion is pending.
///
/// Jobs run strictly one after another in the order they were pushed, so a
/// slow source queued first always lands before a fast one queued later.
/// Once a job fails, the remaining jobs are drained without running.
pub(crate) struct Sequencer {
    tx: Sender<Job>,
    handle: JoinHandle<(Rules, Result<()>)>,
}

impl Sequencer {
    /// Move `rules` onto a new worker thread.
    pub(crate) fn spawn(name: &str, rules: Rules) -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let label = name.to_string();

        let handle = thread::Builder::new()
            .name(format!("ingest-{}", name))
            .spawn(move || {
                let mut rules = rules;
                let mut outcome = Ok(());
                let mut done = 0usize;

                for job in rx {
                    if outcome.is_err() {
                        continue;
                    }
                    outcome = job(&mut rules);
                    done += 1;
                }

                log::debug!("[{}] ingestion drained after {} jobs", label, done);
                (rules, outcome)
            })?;

        Ok(Self { tx, handle })
    }

    /// Queue a job behind everything pushed so far.
    ///
    /// Returns `false` if the worker is gone; [`Sequencer::join`] reports why.
    pub(crate) fn push(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }

    /// Close the queue and wait for every job to finish.
    ///
    /// Returns `None` if the worker panicked.
    pub(crate) fn join(self) -> Option<(Rules, Result<()>)> {
        let Sequencer { tx, handle } = self;
        drop(tx);
        handle.join().ok()
    }
}
