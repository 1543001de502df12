//! Seeding and pairing math.
//!
//! Pure functions: bracket sizing, the standard sequential-halving seed
//! order for elimination brackets, and circle-method pairings for round
//! robin schedules.

/// Next power of two >= `participant_count`; the number of round-1 slots.
pub fn bracket_size(participant_count: usize) -> usize {
    participant_count.next_power_of_two()
}

/// Standard sequential-halving seed order for a bracket of `size` slots
/// (`size` must be a power of two).
///
/// Consecutive pairs form the round-1 matches. Seed 1 and seed 2 land in
/// opposite halves so they can only meet in the final; 1/2 vs 3/4 no
/// earlier than the semifinal, and so on. For example `seeding_order(8)`
/// is `[1, 8, 4, 5, 2, 7, 3, 6]`.
pub fn seeding_order(size: usize) -> Vec<u32> {
    debug_assert!(size.is_power_of_two());
    let mut order = vec![1u32];
    let mut width = 1usize;
    while width < size {
        width *= 2;
        let mut next = Vec::with_capacity(width);
        for &seed in &order {
            next.push(seed);
            next.push(width as u32 + 1 - seed);
        }
        order = next;
    }
    order
}

/// Circle-method round robin schedule for `n` participants, identified by
/// index `0..n`.
///
/// Each inner vec is one round of pairings; every participant appears at
/// most once per round. For odd `n` a phantom opponent rotates through the
/// field, so one participant sits out each round and no pairing is emitted
/// for it. Total pairings are always `C(n, 2)`.
pub fn round_robin_pairings(n: usize) -> Vec<Vec<(usize, usize)>> {
    if n < 2 {
        return Vec::new();
    }
    // Even field; for odd n the extra index `n` is the phantom.
    let field = if n % 2 == 0 { n } else { n + 1 };
    let mut slots: Vec<usize> = (0..field).collect();
    let mut rounds = Vec::with_capacity(field - 1);

    for _ in 0..field - 1 {
        let mut pairs = Vec::with_capacity(field / 2);
        for i in 0..field / 2 {
            let a = slots[i];
            let b = slots[field - 1 - i];
            if a < n && b < n {
                pairs.push((a, b));
            }
        }
        rounds.push(pairs);
        // Fix the first slot, rotate the rest clockwise.
        slots[1..].rotate_right(1);
    }
    rounds
}
