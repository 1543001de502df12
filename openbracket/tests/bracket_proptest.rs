//! Structural properties of generated brackets across field sizes.

use std::collections::HashSet;

use chrono::Utc;
use openbracket::engine::models::{
    Participant, ParticipantRef, Stage, TeamSize, Tournament, TournamentFormat, TournamentStatus,
};
use openbracket::engine::seeding::{bracket_size, round_robin_pairings, seeding_order};
use openbracket::engine::build_bracket;
use proptest::prelude::*;
use uuid::Uuid;

fn tournament(format: TournamentFormat) -> Tournament {
    let now = Utc::now();
    Tournament {
        id: Uuid::new_v4(),
        name: "prop".to_string(),
        description: None,
        game: None,
        format,
        team_size: TeamSize::Solo,
        max_participants: 256,
        allow_draws: false,
        status: TournamentStatus::Registration,
        prize_pool: None,
        created_at: now,
        updated_at: now,
    }
}

fn entrants(tournament_id: Uuid, n: usize) -> Vec<Participant> {
    (1..=n)
        .map(|seed| Participant {
            id: Uuid::new_v4(),
            tournament_id,
            reference: ParticipantRef::User(Uuid::new_v4()),
            display_name: format!("p{seed}"),
            seed: seed as u32,
            registered_at: Utc::now(),
        })
        .collect()
}

proptest! {
    #[test]
    fn seeding_order_is_a_permutation_with_balanced_pairs(k in 1u32..=7) {
        let size = 1usize << k;
        let order = seeding_order(size);

        let seen: HashSet<u32> = order.iter().copied().collect();
        prop_assert_eq!(seen.len(), size);
        prop_assert!(order.iter().all(|&s| 1 <= s && s as usize <= size));

        // Every round-1 pair sums to size + 1, so the top seed always meets
        // the bottom seed, second meets second-to-last, and so on.
        for pair in order.chunks(2) {
            prop_assert_eq!(pair[0] + pair[1], size as u32 + 1);
        }
    }

    #[test]
    fn single_elimination_needs_exactly_n_minus_1_games(n in 2usize..=64) {
        let t = tournament(TournamentFormat::SingleElimination);
        let players = entrants(t.id, n);
        let bracket = build_bracket(&t, &players).unwrap();

        let size = bracket_size(n);
        prop_assert_eq!(bracket.rounds.len() as u32, size.ilog2());
        prop_assert_eq!(bracket.decisive_match_count(), n - 1);

        // Round widths halve; round 1 carries exactly size - n byes.
        let widths: Vec<usize> = bracket.rounds.iter().map(|r| r.matches.len()).collect();
        for (i, w) in widths.iter().enumerate() {
            prop_assert_eq!(*w, size >> (i + 1));
        }
        let byes = bracket
            .round(Stage::Winners, 1)
            .unwrap()
            .matches
            .iter()
            .filter(|m| m.is_bye())
            .count();
        prop_assert_eq!(byes, size - n);

        // Everyone appears in round 1 exactly once.
        let mut placed: Vec<Uuid> = bracket
            .round(Stage::Winners, 1)
            .unwrap()
            .matches
            .iter()
            .flat_map(|m| [m.participant1, m.participant2])
            .flatten()
            .collect();
        placed.sort();
        let mut expected: Vec<Uuid> = players.iter().map(|p| p.id).collect();
        expected.sort();
        prop_assert_eq!(placed, expected);
    }

    #[test]
    fn round_robin_plays_every_pair_once(n in 2usize..=20) {
        let t = tournament(TournamentFormat::RoundRobin);
        let players = entrants(t.id, n);
        let bracket = build_bracket(&t, &players).unwrap();

        prop_assert_eq!(bracket.matches().count(), n * (n - 1) / 2);

        let mut pairs = HashSet::new();
        for m in bracket.matches() {
            let a = m.participant1.unwrap();
            let b = m.participant2.unwrap();
            prop_assert_ne!(a, b);
            let key = if a < b { (a, b) } else { (b, a) };
            prop_assert!(pairs.insert(key), "pair played twice");
        }

        // Within a round nobody plays twice.
        for round in &bracket.rounds {
            let mut seen = HashSet::new();
            for m in &round.matches {
                prop_assert!(seen.insert(m.participant1.unwrap()));
                prop_assert!(seen.insert(m.participant2.unwrap()));
            }
        }
    }

    #[test]
    fn round_robin_pairings_have_no_phantom_indices(n in 2usize..=21) {
        for round in round_robin_pairings(n) {
            for (a, b) in round {
                prop_assert!(a < n && b < n);
            }
        }
    }

    #[test]
    fn double_elimination_has_expected_topology(n in 3usize..=64) {
        let t = tournament(TournamentFormat::DoubleElimination);
        let players = entrants(t.id, n);
        let bracket = build_bracket(&t, &players).unwrap();

        let size = bracket_size(n);
        let k = size.ilog2();

        let winners = bracket.rounds.iter().filter(|r| r.stage == Stage::Winners).count();
        let losers = bracket.rounds.iter().filter(|r| r.stage == Stage::Losers).count();
        let finals = bracket.rounds.iter().filter(|r| r.stage == Stage::GrandFinal).count();
        prop_assert_eq!(winners as u32, k);
        prop_assert_eq!(losers as u32, 2 * (k - 1));
        prop_assert_eq!(finals, 1);

        // Losers round widths: paired rounds share a width, halving each pair.
        for round in bracket.rounds.iter().filter(|r| r.stage == Stage::Losers) {
            let j = round.round_number;
            prop_assert_eq!(round.matches.len(), size >> (j.div_ceil(2) + 1));
        }
    }
}
