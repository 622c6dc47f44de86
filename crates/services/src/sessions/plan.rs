use rand::Rng;
use rand::seq::SliceRandom;

use vocab_core::model::{Item, ItemId, MasteryLevel, ReviewMode};

/// Candidate items for a session, grouped by the tier they are drawn from.
///
/// `known` holds both `Known` and `Mastered` items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatePools {
    pub new: Vec<ItemId>,
    pub learning: Vec<ItemId>,
    pub known: Vec<ItemId>,
}

impl CandidatePools {
    /// Add an item to the pool matching its current mastery level.
    pub fn push(&mut self, item: &Item) {
        let pool = match item.mastery_level() {
            MasteryLevel::New => &mut self.new,
            MasteryLevel::Learning => &mut self.learning,
            MasteryLevel::Known | MasteryLevel::Mastered => &mut self.known,
        };
        pool.push(item.id());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.new.len() + self.learning.len() + self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<Item> for CandidatePools {
    fn from_iter<I: IntoIterator<Item = Item>>(iter: I) -> Self {
        let mut pools = Self::default();
        for item in iter {
            pools.push(&item);
        }
        pools
    }
}

/// Per-tier draw limits for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quotas {
    pub new: usize,
    pub learning: usize,
    pub known: usize,
}

impl Quotas {
    /// `Mixed` splits `target` into thirds, the known tier taking the remainder.
    /// Shortfalls in one tier are not redistributed.
    #[must_use]
    pub fn for_mode(mode: ReviewMode, target: usize) -> Self {
        match mode {
            ReviewMode::New => Self {
                new: target,
                learning: 0,
                known: 0,
            },
            ReviewMode::Learning => Self {
                new: 0,
                learning: target,
                known: 0,
            },
            ReviewMode::Known => Self {
                new: 0,
                learning: 0,
                known: target,
            },
            ReviewMode::Mixed => {
                let third = target / 3;
                Self {
                    new: third,
                    learning: third,
                    known: target - 2 * third,
                }
            }
        }
    }
}

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub items: Vec<ItemId>,
    pub new_selected: usize,
    pub learning_selected: usize,
    pub known_selected: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Draws a random, duplicate-free selection of items for a review mode.
pub struct SessionBuilder {
    mode: ReviewMode,
    target: usize,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(mode: ReviewMode, target: usize) -> Self {
        Self { mode, target }
    }

    #[must_use]
    pub fn quotas(&self) -> Quotas {
        Quotas::for_mode(self.mode, self.target)
    }

    /// Build a plan from the candidate pools.
    ///
    /// Each tier is shuffled and cut to its quota; the concatenation is shuffled
    /// again so tiers are interleaved. The plan may be shorter than the target,
    /// or empty, when pools run short.
    pub fn build<R: Rng + ?Sized>(self, pools: CandidatePools, rng: &mut R) -> SessionPlan {
        let quotas = self.quotas();
        let new = draw(pools.new, quotas.new, rng);
        let learning = draw(pools.learning, quotas.learning, rng);
        let known = draw(pools.known, quotas.known, rng);

        let new_selected = new.len();
        let learning_selected = learning.len();
        let known_selected = known.len();

        let mut items = new;
        items.extend(learning);
        items.extend(known);
        items.shuffle(rng);

        SessionPlan {
            items,
            new_selected,
            learning_selected,
            known_selected,
        }
    }
}

fn draw<R: Rng + ?Sized>(mut pool: Vec<ItemId>, quota: usize, rng: &mut R) -> Vec<ItemId> {
    if quota == 0 {
        return Vec::new();
    }
    pool.sort_unstable();
    pool.dedup();
    pool.shuffle(rng);
    pool.truncate(quota);
    pool
}
