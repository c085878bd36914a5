use serde::Serialize;

/// What the player has to do while a given counter value is in play
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, strum_macros::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RequiredState {
    Hold,
    Release,
}

impl RequiredState {
    /// Hold on composites (and 0/1), release on primes
    pub fn for_counter(n: u64) -> Self {
        if is_prime(n) {
            RequiredState::Release
        } else {
            RequiredState::Hold
        }
    }

    pub fn wants_pressed(self) -> bool {
        self == RequiredState::Hold
    }
}

/// 6k±1 trial division
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }

    let mut i: u64 = 5;
    // i <= n / i avoids overflowing i * i near u64::MAX
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}
