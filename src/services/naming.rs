//! Order number and destination directory name generation.

use chrono::{Local, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use crate::models::Allocation;

/// Tag appended to every order directory name.
pub const DIRECTORY_SUFFIX: &str = "ab1";

/// Width of the zero-padded numeric order number.
pub const ORDER_NUMBER_WIDTH: usize = 12;

const ORDER_NUMBER_SPACE: u64 = 1_000_000_000_000;

/// Produces candidate order numbers and directory names.
///
/// Candidates only need to be unlikely to collide; the allocator resolves the
/// rare collision by asking for another candidate.
pub trait NameGenerator: Send + Sync {
    fn generate(&self) -> Allocation;
}

/// Random order numbers from a clock-seeded generator, dated directory names.
pub struct TimeSeededNames {
    rng: Mutex<StdRng>,
}

impl TimeSeededNames {
    /// Seed from the current wall clock.
    pub fn new() -> Self {
        let seed = Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        Self::with_seed(seed)
    }

    /// Fixed seed, for reproducible sequences in tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build a candidate dated `date`.
    pub fn candidate_for(&self, date: NaiveDate) -> Allocation {
        let value = {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.random_range(0..ORDER_NUMBER_SPACE)
        };
        let order_number = format!("{:0width$}", value, width = ORDER_NUMBER_WIDTH);
        let directory = directory_name(date, &order_number);

        Allocation {
            order_number,
            directory,
        }
    }
}

impl Default for TimeSeededNames {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator for TimeSeededNames {
    fn generate(&self) -> Allocation {
        self.candidate_for(Local::now().date_naive())
    }
}

/// `YYYYMMDD_<order number>_ab1`
pub fn directory_name(date: NaiveDate, order_number: &str) -> String {
    format!(
        "{}_{}_{}",
        date.format("%Y%m%d"),
        order_number,
        DIRECTORY_SUFFIX
    )
}

/// Check whether a directory name has the shape produced by [`directory_name`].
pub fn is_order_directory(name: &str) -> bool {
    let mut parts = name.split('_');
    let (Some(date), Some(number), Some(suffix), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    date.len() == 8
        && date.bytes().all(|b| b.is_ascii_digit())
        && number.len() == ORDER_NUMBER_WIDTH
        && number.bytes().all(|b| b.is_ascii_digit())
        && suffix == DIRECTORY_SUFFIX
}
