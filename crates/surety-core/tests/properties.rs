//! Property tests for quorum admission, stake accumulation, premium bounds
//! and payout rounding.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use surety_core::types::{AccountId, Amount, FlightStatus};
use surety_core::{ErrorKind, FlightSurety, RegistrationOutcome, ResponseOutcome, SuretyConfig};

fn id(s: &str) -> AccountId {
    AccountId::new(s)
}

fn surety(seed: u64) -> FlightSurety {
    let (surety, _stream) = FlightSurety::with_rng(
        SuretyConfig {
            unit: 10,
            ..SuretyConfig::default()
        },
        id("admin"),
        id("a1"),
        StdRng::seed_from_u64(seed),
    )
    .unwrap();
    surety
}

/// Grow the registry to `n` staked airlines named a1..=a{n}.
fn grow(surety: &FlightSurety, n: usize) -> Vec<AccountId> {
    let gov = surety.governance();
    let stake = surety.config().min_stake();
    let mut members = vec![id("a1")];
    for i in 2..=n {
        let candidate = id(&format!("a{i}"));
        for endorser in members.clone() {
            if gov.register_airline(&candidate, &endorser).unwrap().is_registered() {
                break;
            }
        }
        gov.add_stake(&candidate, stake).unwrap();
        members.push(candidate);
    }
    members
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Below the floor one endorsement admits; from the floor exactly
    /// ceil(n/2) distinct endorsements are needed, and repeats never count.
    #[test]
    fn admission_requires_quorum(n in 1usize..10) {
        let surety = surety(1);
        let members = grow(&surety, n);
        let gov = surety.governance();
        prop_assert_eq!(gov.registered_airline_count().unwrap(), n);

        let required = if n < 4 { 1 } else { n.div_ceil(2) };
        let candidate = id("candidate");
        for (i, endorser) in members.iter().take(required).enumerate() {
            let outcome = gov.register_airline(&candidate, endorser).unwrap();
            if i + 1 < required {
                prop_assert_eq!(
                    outcome,
                    RegistrationOutcome::Pending { endorsements: i + 1, required }
                );
                let repeat = gov.register_airline(&candidate, endorser).unwrap_err();
                prop_assert_eq!(repeat.kind(), ErrorKind::DuplicateVote);
                prop_assert!(!gov.is_registered(&candidate).unwrap());
            } else {
                prop_assert!(outcome.is_registered());
            }
        }
        prop_assert!(gov.is_registered(&candidate).unwrap());
    }

    /// hasStakes turns true exactly when accepted deposits reach the minimum.
    #[test]
    fn stake_accumulates_additively(deposits in prop::collection::vec(0u128..250, 1..8)) {
        let surety = surety(2);
        let gov = surety.governance();
        gov.register_airline(&id("a2"), &id("a1")).unwrap();
        let min = surety.config().min_stake();

        let mut total = Amount::ZERO;
        for deposit in deposits {
            let result = gov.add_stake(&id("a2"), Amount(deposit));
            if Amount(deposit) >= min {
                total = total.checked_add(Amount(deposit)).unwrap();
                prop_assert_eq!(result.unwrap(), total);
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAmount);
            }
            prop_assert_eq!(gov.has_stakes(&id("a2")).unwrap(), total >= min);
            let stake = gov.airline(&id("a2")).unwrap().map(|a| a.stake);
            prop_assert_eq!(stake, Some(total));
        }
    }

    /// Premiums are accepted only in 1..=cap, and only once per passenger.
    #[test]
    fn premium_bounds(premium in 0u128..40) {
        let surety = surety(3);
        let cap = surety.config().max_premium();
        let flight = surety
            .insurance()
            .register_flight(&id("a1"), "ND1309", 1, &id("a1"))
            .unwrap();
        let result = surety.insurance().buy_insurance(&flight, &id("p"), Amount(premium));
        if premium == 0 || Amount(premium) > cap {
            prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::InvalidAmount);
            prop_assert!(surety.insurance().policy(&flight, &id("p")).unwrap().is_none());
        } else {
            prop_assert!(result.is_ok());
            let again = surety.insurance().buy_insurance(&flight, &id("p"), Amount(premium));
            prop_assert_eq!(again.unwrap_err().kind(), ErrorKind::DuplicatePolicy);
        }
    }

    /// Payout is premium * 3 / 2 rounded down.
    #[test]
    fn payout_rounds_down(premium in 1u128..=10, seed in any::<u64>()) {
        let surety = surety(seed);
        let flight = surety
            .insurance()
            .register_flight(&id("a1"), "ND1309", 1, &id("a1"))
            .unwrap();
        surety.insurance().buy_insurance(&flight, &id("p"), Amount(premium)).unwrap();

        let key = surety.oracles().fetch_flight_status(&flight, &id("p")).unwrap();
        let fee = surety.config().registration_fee();
        let mut resolved = false;
        for _ in 0..1000 {
            let oracle = AccountId::generate();
            let indexes = surety.oracles().register_oracle(&oracle, fee).unwrap();
            if !indexes.contains(&key.index) {
                continue;
            }
            let outcome = surety
                .oracles()
                .submit_oracle_response(key.index, &flight, FlightStatus::LateAirline, &oracle)
                .unwrap();
            if matches!(outcome, ResponseOutcome::Resolved { .. }) {
                resolved = true;
                break;
            }
        }
        prop_assert!(resolved);
        prop_assert_eq!(
            surety.insurance().credit_balance(&id("p")).unwrap(),
            Amount(premium * 3 / 2)
        );
    }
}
