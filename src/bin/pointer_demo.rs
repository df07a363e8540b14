// Value, address-of and dereference walkthrough
// One integer, two access paths: the original binding and a borrow of it.

use colored::Colorize;
use serde::Deserialize;
use std::cell::Cell;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

// =============================================================================
// Part 1: Errors and configuration
// =============================================================================

#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Failed to write demonstration output: {0}")]
    Output(#[from] io::Error),

    #[error("Failed to parse configuration: {0}")]
    Config(String),

    #[error("Failed to read {}: {source}", .path.display())]
    ReadConfig { path: PathBuf, source: io::Error },

    #[error("Incrementing {value} by {step} overflows i32")]
    Overflow { value: i32, step: i32 },
}

impl From<toml::de::Error> for DemoError {
    fn from(err: toml::de::Error) -> Self {
        DemoError::Config(err.to_string())
    }
}

/// Starting value and the amount added through the dereferenced address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub initial_value: i32,
    pub step: i32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            initial_value: 234,
            step: 1,
        }
    }
}

impl DemoConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, DemoError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, DemoError> {
        let content = fs::read_to_string(path).map_err(|source| DemoError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}

// =============================================================================
// Part 2: Addresses and the run transcript
// =============================================================================

/// Numeric storage location, printed the way `{:p}` prints a pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(usize);

impl Address {
    pub fn of<T>(place: &T) -> Self {
        Address(place as *const T as usize)
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Everything a single run emitted, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub initial: i32,
    pub address: Address,
    pub updated: i32,
    pub pointer: Address,
    pub pointee: i32,
    pub loop_passes: u32,
}

impl Transcript {
    /// The output lines exactly as written to the sink.
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("value =  {}", self.initial),
            format!("value =  {}", self.address),
            format!("value =  {}", self.updated),
            self.pointer.to_string(),
            self.pointee.to_string(),
        ]
    }

    /// True when the pointer names the printed address and reads the updated value.
    pub fn aliases(&self) -> bool {
        self.address == self.pointer && self.updated == self.pointee
    }
}

// =============================================================================
// Part 3: The demonstration
// =============================================================================

fn emit<W: Write>(out: &mut W, line: impl fmt::Display) -> Result<(), DemoError> {
    writeln!(out, "{line}")?;
    Ok(())
}

pub fn demonstrate<W: Write>(out: &mut W, config: &DemoConfig) -> Result<Transcript, DemoError> {
    let value = Cell::new(config.initial_value);

    let initial = value.get();
    emit(out, format_args!("value =  {initial}"))?;

    let address = Address::of(&value);
    emit(out, format_args!("value =  {address}"))?;

    let pointer: &Cell<i32> = &value;

    // Through a fresh borrow of `value`, not through `pointer`.
    let target = &value;
    let next = target
        .get()
        .checked_add(config.step)
        .ok_or(DemoError::Overflow {
            value: target.get(),
            step: config.step,
        })?;
    target.set(next);

    let updated = Cell::get(&value);
    emit(out, format_args!("value =  {updated}"))?;

    let pointer_address = Address::of(pointer);
    emit(out, pointer_address)?;

    let pointee = pointer.get();
    emit(out, pointee)?;

    let mut loop_passes = 0;
    #[allow(clippy::never_loop)]
    loop {
        loop_passes += 1;
        break;
    }

    out.flush()?;

    Ok(Transcript {
        initial,
        address,
        updated,
        pointer: pointer_address,
        pointee,
        loop_passes,
    })
}

fn main() {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    if let Err(err) = demonstrate(&mut out, &DemoConfig::default()) {
        eprintln!("{} {}", "Error:".red().bold(), err);
        std::process::exit(1);
    }
}

// =============================================================================
// Tests
// =============================================================================
