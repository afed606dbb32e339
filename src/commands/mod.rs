//! CLI command implementations
//!
//! Commands are methods on [`Console`], which owns the output writer so the
//! same code path serves stdout, the pager, and test buffers:
//!
//! - `diff`: Compare two files and print the unified diff
//! - `apply`: Patch a file with a unified diff
//! - `stats`: Tally the changes a patch carries

pub mod apply;
pub mod diff;
pub mod stats;

use std::cell::{RefCell, RefMut};
use std::io::Write;

pub struct Console {
    writer: RefCell<Box<dyn Write>>,
}

impl Console {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn writer(&'_ self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }
}
