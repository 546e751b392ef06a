//! Id generators.
//!
//! [`Snowflake`] packs a millisecond timestamp, a node id and a per-millisecond
//! sequence into one positive `i64`:
//!
//! ```text
//!  63  62                     22 21      17 16      12 11          0
//! ┌───┬─────────────────────────┬──────────┬──────────┬─────────────┐
//! │ 0 │ millis since epoch (41) │ dc (5)   │ worker(5)│ sequence(12)│
//! └───┴─────────────────────────┴──────────┴──────────┴─────────────┘
//! ```
//!
//! Ids from one generator are strictly increasing. Ids from generators with
//! distinct `(datacenter_id, worker_id)` pairs never collide.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{IdError, Result};

/// Produces unique ids.
pub trait IdGenerator: Send + Sync {
    fn generate_id(&self) -> Result<i64>;
}

const TIMESTAMP_BITS: u32 = 41;
const DATACENTER_BITS: u32 = 5;
const WORKER_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;

const MAX_DATACENTER_ID: u32 = (1 << DATACENTER_BITS) - 1;
const MAX_WORKER_ID: u32 = (1 << WORKER_BITS) - 1;
const MAX_SEQUENCE: i64 = (1 << SEQUENCE_BITS) - 1;
const MAX_ELAPSED: i64 = (1 << TIMESTAMP_BITS) - 1;

const WORKER_SHIFT: u32 = SEQUENCE_BITS;
const DATACENTER_SHIFT: u32 = SEQUENCE_BITS + WORKER_BITS;
const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + WORKER_BITS + DATACENTER_BITS;

/// 2020-01-01T00:00:00Z.
pub const DEFAULT_EPOCH_MILLIS: i64 = 1_577_836_800_000;

/// Node identity and epoch of a [`Snowflake`] generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnowflakeConfig {
    pub epoch_millis: i64,
    pub datacenter_id: u32,
    pub worker_id: u32,
}

impl Default for SnowflakeConfig {
    fn default() -> Self {
        Self {
            epoch_millis: DEFAULT_EPOCH_MILLIS,
            datacenter_id: 0,
            worker_id: 0,
        }
    }
}

impl SnowflakeConfig {
    pub fn node(datacenter_id: u32, worker_id: u32) -> Self {
        Self {
            datacenter_id,
            worker_id,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.datacenter_id > MAX_DATACENTER_ID {
            return Err(IdError::InvalidNode {
                field: "datacenter_id",
                value: self.datacenter_id,
                max: MAX_DATACENTER_ID,
            });
        }
        if self.worker_id > MAX_WORKER_ID {
            return Err(IdError::InvalidNode {
                field: "worker_id",
                value: self.worker_id,
                max: MAX_WORKER_ID,
            });
        }
        Ok(())
    }
}

/// The fields of a snowflake id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnowflakeParts {
    /// Unix milliseconds.
    pub millis: i64,
    pub datacenter_id: u32,
    pub worker_id: u32,
    pub sequence: u32,
}

type Clock = Box<dyn Fn() -> i64 + Send + Sync>;

struct State {
    last_millis: i64,
    sequence: i64,
}

/// Time-ordered 64-bit id generator.
///
/// ```
/// use quarry_id::{IdGenerator, Snowflake, SnowflakeConfig};
///
/// let generator = Snowflake::new(SnowflakeConfig::node(1, 2)).unwrap();
/// let a = generator.generate_id().unwrap();
/// let b = generator.generate_id().unwrap();
/// assert!(b > a);
///
/// let parts = generator.decompose(b);
/// assert_eq!((parts.datacenter_id, parts.worker_id), (1, 2));
/// ```
pub struct Snowflake {
    config: SnowflakeConfig,
    clock: Clock,
    state: Mutex<State>,
}

impl Snowflake {
    pub fn new(config: SnowflakeConfig) -> Result<Self> {
        Self::with_clock(config, system_millis)
    }

    /// A generator reading time from `clock` (Unix milliseconds).
    pub fn with_clock<C>(config: SnowflakeConfig, clock: C) -> Result<Self>
    where
        C: Fn() -> i64 + Send + Sync + 'static,
    {
        config.validate()?;
        Ok(Self {
            config,
            clock: Box::new(clock),
            state: Mutex::new(State {
                last_millis: i64::MIN,
                sequence: 0,
            }),
        })
    }

    pub fn config(&self) -> &SnowflakeConfig {
        &self.config
    }

    pub fn decompose(&self, id: i64) -> SnowflakeParts {
        SnowflakeParts {
            millis: (id >> TIMESTAMP_SHIFT).saturating_add(self.config.epoch_millis),
            datacenter_id: ((id >> DATACENTER_SHIFT) & i64::from(MAX_DATACENTER_ID)) as u32,
            worker_id: ((id >> WORKER_SHIFT) & i64::from(MAX_WORKER_ID)) as u32,
            sequence: (id & MAX_SEQUENCE) as u32,
        }
    }

    fn now(&self, last_millis: i64) -> Result<i64> {
        let now = (self.clock)();
        if now < last_millis {
            return Err(IdError::ClockMovedBackwards {
                last_millis,
                now_millis: now,
            });
        }
        Ok(now)
    }
}

impl IdGenerator for Snowflake {
    fn generate_id(&self) -> Result<i64> {
        let mut state = self.state.lock();
        let mut now = self.now(state.last_millis)?;

        if now == state.last_millis {
            state.sequence = (state.sequence + 1) & MAX_SEQUENCE;
            if state.sequence == 0 {
                // Sequence exhausted for this millisecond.
                while now <= state.last_millis {
                    std::hint::spin_loop();
                    now = self.now(state.last_millis)?;
                }
            }
        } else {
            state.sequence = 0;
        }

        let elapsed = now
            .checked_sub(self.config.epoch_millis)
            .filter(|elapsed| (0..=MAX_ELAPSED).contains(elapsed))
            .ok_or(IdError::TimestampOutOfRange {
                millis: now,
                epoch_millis: self.config.epoch_millis,
            })?;
        state.last_millis = now;

        Ok((elapsed << TIMESTAMP_SHIFT)
            | (i64::from(self.config.datacenter_id) << DATACENTER_SHIFT)
            | (i64::from(self.config.worker_id) << WORKER_SHIFT)
            | state.sequence)
    }
}

impl fmt::Debug for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snowflake")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn system_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
