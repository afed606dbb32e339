//! Core utilities and shared types
//!
//! This module contains shared utilities used across the application.

pub mod scheduler;

use chrono::{DateTime, Duration, Utc};
use derive_new::new;
use minus::Pager;
use std::io::{self, Write};
use std::sync::atomic::{AtomicI64, Ordering};

/// Wrapper that implements `Write` for the minus pager
///
/// The minus pager doesn't implement `std::io::Write` directly, so this
/// wrapper adapts it, letting the diff commands treat the pager as a
/// drop-in replacement for stdout.
///
/// ## Usage
///
/// ```ignore
/// let pager = Pager::new();
/// let mut writer = PagerWriter::new(pager.clone());
/// writeln!(writer, "@@ -1,3 +1,3 @@")?;
/// page_all(pager)?;
/// ```
#[derive(new)]
pub struct PagerWriter {
    pager: Pager,
}

impl PagerWriter {
    pub fn pager(&self) -> &Pager {
        &self.pager
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s =
            std::str::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(s).map_err(io::Error::other)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Source of the current time
///
/// The overlay store and version graph read time through this trait so TTL
/// and expiry tests can drive the clock by hand instead of sleeping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Hand-driven clock for tests
///
/// `advance` is atomic, so a shared `Arc<ManualClock>` can be moved forward
/// from the test while stores read it.
#[derive(Debug)]
pub struct ManualClock {
    base: DateTime<Utc>,
    offset_millis: AtomicI64,
}

impl ManualClock {
    pub fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            offset_millis: AtomicI64::new(0),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_millis
            .fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.base + Duration::milliseconds(self.offset_millis.load(Ordering::SeqCst))
    }
}
