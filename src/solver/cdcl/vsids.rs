use std::{cmp::Ordering, collections::BTreeSet};

use crate::formula::{Literal, Variable};

/// Activity of a variable. The nonce breaks ties randomly and is redrawn on every bump.
#[derive(Clone, Copy, PartialEq)]
struct Activity {
    score: f64,
    nonce: f64,
}

impl Activity {
    fn new(score: f64) -> Self {
        Activity {
            score,
            nonce: rand::random(),
        }
    }

    fn bump(&mut self, delta: f64) -> f64 {
        self.score += delta;
        self.nonce = rand::random();
        self.score
    }
}

#[derive(PartialEq, Clone, Copy)]
struct QueueEntry {
    activity: Activity,
    variable: Variable,
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        let ordering = self
            .activity
            .score
            .partial_cmp(&other.activity.score)
            .expect("NaN in VSIDS score");
        if ordering != Ordering::Equal {
            return ordering;
        }

        let ordering = self
            .activity
            .nonce
            .partial_cmp(&other.activity.nonce)
            .expect("NaN in VSIDS nonce");
        if ordering != Ordering::Equal {
            return ordering;
        }

        self.variable.cmp(&other.variable)
    }
}

/// Variable State Independent Decaying Sum (VSIDS) heuristic.
/// Based on MiniSAT implementation.
///
/// The queue holds candidate decision variables ordered by activity. Assigned variables are
/// removed lazily by the caller and reinserted on backtrack.
#[derive(Default)]
pub struct VsidsScoring {
    current_rate: f64,
    activities: Vec<Activity>,
    queue: BTreeSet<QueueEntry>,
}

impl VsidsScoring {
    const DECAY_RATE: f64 = 0.95;
    const REBALANCE_THRESHOLD: f64 = 1e100;

    /// Creates the heuristic with every variable queued, seeded by its occurrence count.
    pub fn new(occurrences: &[usize]) -> Self {
        let activities: Vec<_> = occurrences
            .iter()
            .map(|&count| Activity::new(count as f64))
            .collect();

        let mut scoring = VsidsScoring {
            current_rate: 1.0,
            activities,
            queue: BTreeSet::new(),
        };
        for index in 0..occurrences.len() {
            if let Some(variable) = Variable::from_index(index) {
                scoring.insert(variable);
            }
        }
        scoring
    }

    fn entry(&self, variable: Variable) -> QueueEntry {
        QueueEntry {
            activity: self.activities[variable.index()],
            variable,
        }
    }

    fn bump_score(&mut self, variable: Variable) {
        let present = self.queue.remove(&self.entry(variable));

        let new_score = self.activities[variable.index()].bump(self.current_rate);

        if present {
            self.queue.insert(self.entry(variable));
        }

        if new_score >= Self::REBALANCE_THRESHOLD {
            self.rebalance();
        }
    }

    fn rebalance(&mut self) {
        self.current_rate /= Self::REBALANCE_THRESHOLD;

        let queued: Vec<Variable> = self.queue.iter().map(|entry| entry.variable).collect();
        for activity in &mut self.activities {
            activity.score /= Self::REBALANCE_THRESHOLD;
        }
        self.queue = queued
            .into_iter()
            .map(|variable| self.entry(variable))
            .collect();
    }

    pub fn insert(&mut self, variable: Variable) {
        trace!("VSIDS insert {}", variable);
        self.queue.insert(self.entry(variable));
    }

    pub fn remove(&mut self, variable: Variable) {
        trace!("VSIDS remove {}", variable);
        self.queue.remove(&self.entry(variable));
    }

    /// The queued variable with the highest activity.
    pub fn top(&self) -> Option<Variable> {
        self.queue.iter().next_back().map(|entry| entry.variable)
    }

    pub fn decay(&mut self) {
        self.current_rate /= Self::DECAY_RATE;
    }

    pub fn learn_clause(&mut self, literals: &[Literal]) {
        for literal in literals {
            self.bump_score(literal.variable());
        }
    }
}
