//! # Stub/Skeleton Contract Tests
//!
//! This crate provides "golden" tests for the call-marshalling contract to
//! ensure it doesn't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Every contract is written as code
//! - **Testability first**: Contract tests fail when marshalling changes
//! - **Direct call is the oracle**: A stub call must behave exactly like
//!   the same call made directly on the privileged side
//!
//! ## Structure
//!
//! - `register`: every arity and mutability combination against direct calls
//! - `counter`: the counter scenario and call ordering
//! - `arith`: free-function stubs
//! - `lifecycle`: construction, destruction and heap accounting
//! - `isolation`: privilege, faults, audit and concurrency through the gate

pub mod arith;
pub mod counter;
pub mod isolation;
pub mod lifecycle;
pub mod register;

/// Privileged fixtures and their generated stubs
pub mod test_helpers {
    use std::cell::{Cell, RefCell};
    use stub_skeleton::{function_stub, stub};
    use thiserror::Error;

    /// Counter-like privileged type
    #[derive(Debug, Default)]
    pub struct Counter {
        value: i64,
    }

    impl Counter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn increment(&mut self, by: i64) {
            self.value += by;
        }

        pub fn value(&self) -> i64 {
            self.value
        }
    }

    stub! {
        /// User-side proxy for [`Counter`]
        pub struct CounterStub for Counter;

        construct fn new();
        fn increment(&mut self, by: i64);
        fn value(&self) -> i64;
    }

    /// Privileged type with one operation per arity and mutability
    #[derive(Debug, Default)]
    pub struct Register {
        total: i64,
        notes: RefCell<Vec<i64>>,
    }

    impl Register {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_total(total: i64) -> Self {
            Self {
                total,
                ..Self::default()
            }
        }

        pub fn with_pair(tens: i64, ones: i64) -> Self {
            Self::with_total(tens * 10 + ones)
        }

        pub fn with_triple(hundreds: i64, tens: i64, ones: i64) -> Self {
            Self::with_total(hundreds * 100 + tens * 10 + ones)
        }

        pub fn clear(&mut self) {
            self.total = 0;
        }

        pub fn set(&mut self, value: i64) {
            self.total = value;
        }

        pub fn set_difference(&mut self, a: i64, b: i64) {
            self.total = a - b;
        }

        pub fn set_weighted(&mut self, a: i64, b: i64, c: i64) {
            self.total = a + 2 * b + 3 * c;
        }

        pub fn bump(&mut self) -> i64 {
            self.total += 1;
            self.total
        }

        pub fn accumulate(&mut self, amount: i64) -> i64 {
            self.total += amount;
            self.total
        }

        pub fn scale_add(&mut self, factor: i64, offset: i64) -> i64 {
            self.total = self.total * factor + offset;
            self.total
        }

        pub fn clamp_to(&mut self, low: i64, high: i64, fallback: i64) -> i64 {
            if self.total < low || self.total > high {
                self.total = fallback;
            }
            self.total
        }

        pub fn total(&self) -> i64 {
            self.total
        }

        pub fn offset(&self, amount: i64) -> i64 {
            self.total + amount
        }

        pub fn describe(&self, label: String, width: usize) -> String {
            format!("{}={:>width$}", label, self.total, width = width)
        }

        pub fn linear(&self, a: i64, b: i64, c: i64) -> i64 {
            a * self.total * self.total + b * self.total + c
        }

        pub fn mark(&self) {
            self.notes.borrow_mut().push(self.total);
        }

        pub fn note(&self, value: i64) {
            self.notes.borrow_mut().push(value);
        }

        pub fn note_pair(&self, a: i64, b: i64) {
            self.notes.borrow_mut().extend([a, b]);
        }

        pub fn note_triple(&self, a: i64, b: i64, c: i64) {
            self.notes.borrow_mut().extend([a, b, c]);
        }

        pub fn notes(&self) -> Vec<i64> {
            self.notes.borrow().clone()
        }

        pub fn divide(&self, divisor: i64) -> i64 {
            self.total / divisor
        }
    }

    stub! {
        /// User-side proxy for [`Register`]
        pub struct RegisterStub for Register;

        construct fn new();
        construct fn with_total(total: i64);
        construct fn with_pair(tens: i64, ones: i64);
        construct fn with_triple(hundreds: i64, tens: i64, ones: i64);

        fn clear(&mut self);
        fn set(&mut self, value: i64);
        fn set_difference(&mut self, a: i64, b: i64);
        fn set_weighted(&mut self, a: i64, b: i64, c: i64);

        fn bump(&mut self) -> i64;
        fn accumulate(&mut self, amount: i64) -> i64;
        fn scale_add(&mut self, factor: i64, offset: i64) -> i64;
        fn clamp_to(&mut self, low: i64, high: i64, fallback: i64) -> i64;

        fn total(&self) -> i64;
        fn offset(&self, amount: i64) -> i64;
        fn describe(&self, label: String, width: usize) -> String;
        fn linear(&self, a: i64, b: i64, c: i64) -> i64;

        fn mark(&self);
        fn note(&self, value: i64);
        fn note_pair(&self, a: i64, b: i64);
        fn note_triple(&self, a: i64, b: i64, c: i64);
        fn notes(&self) -> Vec<i64>;

        fn divide(&self, divisor: i64) -> i64;
    }

    /// Account errors
    #[derive(Debug, Clone, Error, PartialEq, Eq)]
    pub enum AccountError {
        #[error("Insufficient funds: requested {requested}, available {available}")]
        InsufficientFunds { requested: u64, available: u64 },
    }

    /// Privileged type whose operations return `Result`
    #[derive(Debug)]
    pub struct Account {
        balance: u64,
    }

    impl Account {
        pub fn open(initial: u64) -> Self {
            Self { balance: initial }
        }

        pub fn withdraw(&mut self, amount: u64) -> Result<u64, AccountError> {
            if amount > self.balance {
                return Err(AccountError::InsufficientFunds {
                    requested: amount,
                    available: self.balance,
                });
            }
            self.balance -= amount;
            Ok(self.balance)
        }

        pub fn balance(&self) -> u64 {
            self.balance
        }
    }

    stub! {
        /// User-side proxy for [`Account`]
        pub struct AccountStub for Account;

        construct fn open(initial: u64);
        fn withdraw(&mut self, amount: u64) -> Result<u64, AccountError>;
        fn balance(&self) -> u64;
    }

    thread_local! {
        static DROPPED: RefCell<Vec<u32>> = const { RefCell::new(Vec::new()) };
        static TALLY: Cell<i64> = const { Cell::new(0) };
    }

    /// Privileged type that reports its own destruction
    #[derive(Debug)]
    pub struct Tracked {
        tag: u32,
    }

    impl Tracked {
        pub fn new(tag: u32) -> Self {
            Self { tag }
        }

        pub fn tag(&self) -> u32 {
            self.tag
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            DROPPED.with(|dropped| dropped.borrow_mut().push(self.tag));
        }
    }

    stub! {
        /// User-side proxy for [`Tracked`]
        pub struct TrackedStub for Tracked;

        construct fn new(tag: u32);
        fn tag(&self) -> u32;
    }

    /// Tags of every [`Tracked`] destroyed on this thread, in order
    pub fn dropped_tags() -> Vec<u32> {
        DROPPED.with(|dropped| dropped.borrow().clone())
    }

    /// Privileged free functions
    pub mod arith {
        use super::TALLY;
        use kernel_api::{privilege, PrivilegeLevel};

        pub fn answer() -> i32 {
            42
        }

        pub fn negate(a: i32) -> i32 {
            -a
        }

        pub fn add(a: i32, b: i32) -> i32 {
            a + b
        }

        pub fn mul_add(a: i32, b: i32, c: i32) -> i32 {
            a * b + c
        }

        pub fn tally_reset() {
            TALLY.with(|tally| tally.set(0));
        }

        pub fn tally(a: i64) {
            TALLY.with(|tally| tally.set(tally.get() + a));
        }

        pub fn tally_pair(a: i64, b: i64) {
            tally(a);
            tally(b);
        }

        pub fn tally_triple(a: i64, b: i64, c: i64) {
            tally_pair(a, b);
            tally(c);
        }

        pub fn tally_value() -> i64 {
            TALLY.with(|tally| tally.get())
        }

        pub fn current_level() -> PrivilegeLevel {
            privilege::current()
        }

        pub fn checked_div(a: i32, b: i32) -> Result<i32, String> {
            a.checked_div(b).ok_or_else(|| format!("cannot divide {} by {}", a, b))
        }
    }

    function_stub! {
        /// Stub for [`arith::answer`]
        pub fn answer() -> i32 = arith::answer;
        pub fn negate(a: i32) -> i32 = arith::negate;
        pub fn add(a: i32, b: i32) -> i32 = arith::add;
        pub fn mul_add(a: i32, b: i32, c: i32) -> i32 = arith::mul_add;

        pub fn tally_reset() = arith::tally_reset;
        pub fn tally(a: i64) = arith::tally;
        pub fn tally_pair(a: i64, b: i64) = arith::tally_pair;
        pub fn tally_triple(a: i64, b: i64, c: i64) = arith::tally_triple;
        pub fn tally_value() -> i64 = arith::tally_value;

        pub fn current_level() -> kernel_api::PrivilegeLevel = arith::current_level;
        pub fn checked_div(a: i32, b: i32) -> Result<i32, String> = arith::checked_div;
    }
}
