// crates/sim/src/seed.rs
//! Simulator configuration and the seeded starting data.

use std::time::Duration;

use crate::store::Store;

pub const MY_LIST: &str = "My List";
pub const LIKED_COLLECTION: &str = "Liked Companies List";
pub const IGNORE_COLLECTION: &str = "Companies to Ignore List";

const LIKED_SEED: usize = 10;
const IGNORE_SEED: usize = 50;

const ADJECTIVES: &[&str] = &[
    "Amber", "Brisk", "Cobalt", "Dapper", "Early", "Frosty", "Golden", "Hidden", "Ivory", "Jolly",
    "Keen", "Lunar", "Mellow", "Nimble", "Opal", "Plucky", "Quiet", "Rustic", "Silver", "Tidal",
];

const NOUNS: &[&str] = &[
    "Anchor", "Beacon", "Canyon", "Delta", "Ember", "Falcon", "Grove", "Harbor", "Island", "Juniper",
    "Kestrel", "Lantern", "Meadow", "Nectar", "Orchard", "Pinnacle", "Quarry", "Ridge", "Summit", "Thicket",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Companies created in "My List".
    pub companies: usize,
    /// Time each insert takes.
    pub insert_delay: Duration,
    /// Fail a job once this many companies have been inserted.
    pub fail_after: Option<u64>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            companies: 1000,
            insert_delay: Duration::from_millis(100),
            fail_after: None,
        }
    }
}

impl SimConfig {
    pub fn with_companies(mut self, companies: usize) -> Self {
        self.companies = companies;
        self
    }

    pub fn with_insert_delay(mut self, delay: Duration) -> Self {
        self.insert_delay = delay;
        self
    }

    pub fn with_fail_after(mut self, inserted: Option<u64>) -> Self {
        self.fail_after = inserted;
        self
    }
}

fn company_name(i: usize) -> String {
    let adjective = ADJECTIVES[i % ADJECTIVES.len()];
    let noun = NOUNS[(i / ADJECTIVES.len()) % NOUNS.len()];
    let round = i / (ADJECTIVES.len() * NOUNS.len());
    if round == 0 {
        format!("{adjective} {noun}")
    } else {
        format!("{adjective} {noun} {}", round + 1)
    }
}

impl Store {
    /// Three collections: every company in "My List", the first ten liked,
    /// the first fifty ignored.
    pub fn seeded(companies: usize) -> Self {
        let mut store = Store::new();
        let ids: Vec<_> = (0..companies).map(|i| store.add_company(company_name(i))).collect();

        let my_list = store.add_collection(MY_LIST);
        let liked = store.add_collection(LIKED_COLLECTION);
        let ignore = store.add_collection(IGNORE_COLLECTION);
        store.set_liked_collection(liked.clone());

        for &id in &ids {
            store.insert(&my_list, id);
        }
        for &id in ids.iter().take(LIKED_SEED) {
            store.insert(&liked, id);
        }
        for &id in ids.iter().take(IGNORE_SEED) {
            store.insert(&ignore, id);
        }

        tracing::debug!(companies, "Seeded simulated store");
        store
    }
}
