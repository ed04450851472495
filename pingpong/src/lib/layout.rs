//! The four subjects of the experiment.
//!
//! Their payloads are boring on purpose: what matters is how far apart
//! the integers sit, measured in cache lines. Every claim below is
//! checked at compile time.
//!
//! > ***ATTENTION:*** The pairs are written by every worker at once,
//! > with no lock. That race is the whole point: we are measuring what
//! > fighting over a line costs. The fields are `AtomicI32`s touched only
//! > with `Relaxed` loads and stores, which have the exact footprint of a
//! > bare `i32` and compile down to plain moves. Values read back are
//! > garbage and are thrown away. Do not "fix" this with a mutex.
use crate::interference::{CONSTRUCTIVE_INTERFERENCE_SIZE, DESTRUCTIVE_INTERFERENCE_SIZE};
use crate::utils::*;

/// A slot that exactly one worker writes to.
pub trait ScalarSlot: Default + Send {
    fn store(&mut self, v: i32);
    fn load(&self) -> i32;
}

/// A pair that every worker writes to.
pub trait SharedPair: Default + Sync {
    fn store(&self, first: i32, second: i32);
    /// Sum of both fields, as seen by the caller right now.
    fn sum(&self) -> UselessResult;
}

/// Wraps an `i32`. Natural alignment packs many of these on one line,
/// so neighbouring slots suffer false sharing.
#[derive(Clone, Copy, Debug, Default)]
#[repr(C)]
pub struct NaiveScalar {
    value: i32,
}

/// Wraps an `i32`, aligned so that no two slots share a line.
#[derive(Clone, Copy, Debug, Default)]
#[cfg_attr(
    any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "powerpc64"),
    repr(C, align(128))
)]
#[cfg_attr(target_arch = "s390x", repr(C, align(256)))]
#[cfg_attr(
    any(
        target_arch = "arm",
        target_arch = "mips",
        target_arch = "mips64",
        target_arch = "sparc",
        target_arch = "hexagon",
    ),
    repr(C, align(32))
)]
#[cfg_attr(
    not(any(
        target_arch = "x86_64",
        target_arch = "aarch64",
        target_arch = "powerpc64",
        target_arch = "s390x",
        target_arch = "arm",
        target_arch = "mips",
        target_arch = "mips64",
        target_arch = "sparc",
        target_arch = "hexagon",
    )),
    repr(C, align(64))
)]
pub struct AlignedScalar {
    value: i32,
}

/// Two integers pushed too far apart to ever share a line.
#[derive(Debug)]
#[repr(C)]
pub struct SpreadPair {
    first:   AtomicI32,
    _gap:    [u8; CONSTRUCTIVE_INTERFERENCE_SIZE],
    second:  AtomicI32,
}

/// Two adjacent integers, guaranteed to share a line.
#[derive(Debug, Default)]
#[repr(C)]
pub struct PackedPair {
    first:  AtomicI32,
    second: AtomicI32,
}

const _: () = assert!(align_of::<NaiveScalar>() < DESTRUCTIVE_INTERFERENCE_SIZE);
const _: () = assert!(align_of::<AlignedScalar>() == DESTRUCTIVE_INTERFERENCE_SIZE);
const _: () = assert!(size_of::<SpreadPair>() > CONSTRUCTIVE_INTERFERENCE_SIZE);
const _: () = assert!(size_of::<PackedPair>() <= CONSTRUCTIVE_INTERFERENCE_SIZE);

impl ScalarSlot for NaiveScalar {
    #[inline(always)]
    fn store(&mut self, v: i32) {
        // Volatile, so that no iteration gets folded into the last one.
        // SAFETY: `&mut self.value` is valid and exclusive.
        unsafe { ptr::write_volatile(&mut self.value, v) }
    }

    #[inline(always)]
    fn load(&self) -> i32 {
        self.value
    }
}

impl ScalarSlot for AlignedScalar {
    #[inline(always)]
    fn store(&mut self, v: i32) {
        // SAFETY: see `NaiveScalar::store`.
        unsafe { ptr::write_volatile(&mut self.value, v) }
    }

    #[inline(always)]
    fn load(&self) -> i32 {
        self.value
    }
}

impl Default for SpreadPair {
    fn default() -> Self {
        Self {
            first:  AtomicI32::new(0),
            _gap:   [0; CONSTRUCTIVE_INTERFERENCE_SIZE],
            second: AtomicI32::new(0),
        }
    }
}

impl SharedPair for SpreadPair {
    #[inline(always)]
    fn store(&self, first: i32, second: i32) {
        self.first.store(first, Ordering::Relaxed);
        self.second.store(second, Ordering::Relaxed);
    }

    fn sum(&self) -> UselessResult {
        (self.first.load(Ordering::Relaxed) as UselessResult)
            .wrapping_add(self.second.load(Ordering::Relaxed) as UselessResult)
    }
}

impl SharedPair for PackedPair {
    #[inline(always)]
    fn store(&self, first: i32, second: i32) {
        self.first.store(first, Ordering::Relaxed);
        self.second.store(second, Ordering::Relaxed);
    }

    fn sum(&self) -> UselessResult {
        (self.first.load(Ordering::Relaxed) as UselessResult)
            .wrapping_add(self.second.load(Ordering::Relaxed) as UselessResult)
    }
}

/// Footprint of one variant, as reported before it is sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariantInfo {
    pub name:  &'static str,
    pub size:  usize,
    pub align: usize,
}

impl VariantInfo {
    fn of<T>(name: &'static str) -> Self {
        Self {
            name,
            size:  size_of::<T>(),
            align: align_of::<T>(),
        }
    }
}

/// The variants, in the order the driver samples them.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum, Debug)]
pub enum Variant {
    /// One `i32` per slot, naturally aligned
    Naive,
    /// One `i32` per slot, cache-line aligned
    Aligned,
    /// A shared pair, fields on different lines
    Spread,
    /// A shared pair, fields on one line
    Packed,
}

impl Variant {
    pub const ALL: [Variant; 4] = [
        Variant::Naive,
        Variant::Aligned,
        Variant::Spread,
        Variant::Packed,
    ];

    pub fn info(&self) -> VariantInfo {
        match self {
            Variant::Naive   => VariantInfo::of::<NaiveScalar>("NaiveScalar"),
            Variant::Aligned => VariantInfo::of::<AlignedScalar>("AlignedScalar"),
            Variant::Spread  => VariantInfo::of::<SpreadPair>("SpreadPair"),
            Variant::Packed  => VariantInfo::of::<PackedPair>("PackedPair"),
        }
    }
}
