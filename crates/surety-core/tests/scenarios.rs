//! End-to-end scenarios across governance, insurance and oracle consensus.

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::SeedableRng;
use surety_core::types::{AccountId, Amount, FlightKey, FlightStatus, OracleIndex, SuretyEvent};
use surety_core::{
    ErrorKind, EventStream, FlightSurety, RailError, RegistrationOutcome, ResponseOutcome,
    SettlementRail, SuretyConfig, SuretyError,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn id(s: &str) -> AccountId {
    AccountId::new(s)
}

/// One native unit = 10 minor units: premium cap 10, stake 100, oracle fee 10.
fn config() -> SuretyConfig {
    SuretyConfig {
        unit: 10,
        ..SuretyConfig::default()
    }
}

fn surety() -> (FlightSurety, EventStream) {
    FlightSurety::with_rng(config(), id("admin"), id("A1"), StdRng::seed_from_u64(42)).unwrap()
}

fn drain(stream: &mut EventStream) -> Vec<SuretyEvent> {
    let mut events = Vec::new();
    while let Ok(envelope) = stream.try_recv() {
        events.push(envelope.event);
    }
    events
}

/// Register fresh oracles until `count` of them hold `index`.
fn oracles_for(surety: &FlightSurety, index: OracleIndex, count: usize) -> Vec<AccountId> {
    let fee = surety.config().registration_fee();
    let mut holders = Vec::new();
    for _ in 0..1000 {
        let oracle = AccountId::generate();
        let indexes = surety.oracles().register_oracle(&oracle, fee).unwrap();
        if indexes.contains(&index) {
            holders.push(oracle);
            if holders.len() == count {
                return holders;
            }
        }
    }
    panic!("could not find {count} oracles for index {index}");
}

fn insured_flight(surety: &FlightSurety, passengers: &[(&str, u128)]) -> FlightKey {
    let flight = surety
        .insurance()
        .register_flight(&id("A1"), "ND1309", 1_700_000_000, &id("A1"))
        .unwrap();
    for (passenger, premium) in passengers {
        surety
            .insurance()
            .buy_insurance(&flight, &id(passenger), Amount(*premium))
            .unwrap();
    }
    flight
}

fn resolve(
    surety: &FlightSurety,
    flight: &FlightKey,
    status: FlightStatus,
) -> (OracleIndex, ResponseOutcome) {
    let key = surety
        .oracles()
        .fetch_flight_status(flight, &id("P"))
        .unwrap();
    let oracles = oracles_for(surety, key.index, 3);
    let mut last = None;
    for oracle in &oracles {
        last = Some(
            surety
                .oracles()
                .submit_oracle_response(key.index, flight, status, oracle)
                .unwrap(),
        );
    }
    (key.index, last.unwrap())
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

#[test]
fn airline_admission_scenario() {
    let (surety, _stream) = surety();
    let gov = surety.governance();
    let stake = surety.config().min_stake();

    // A1 (founder, staked) registers A2; A2 stakes.
    assert!(gov.register_airline(&id("A2"), &id("A1")).unwrap().is_registered());
    gov.add_stake(&id("A2"), stake).unwrap();

    // With only 2 airlines, A2's single endorsement admits A3.
    assert!(gov.register_airline(&id("A3"), &id("A2")).unwrap().is_registered());
    assert!(gov.register_airline(&id("A4"), &id("A1")).unwrap().is_registered());
    assert_eq!(gov.registered_airline_count().unwrap(), 4);

    // n = 4: A5 needs 2 of {A1, A2, A3, A4}.
    let first = gov.register_airline(&id("A5"), &id("A1")).unwrap();
    assert_eq!(
        first,
        RegistrationOutcome::Pending {
            endorsements: 1,
            required: 2
        }
    );
    assert!(!gov.is_registered(&id("A5")).unwrap());

    let second = gov.register_airline(&id("A5"), &id("A2")).unwrap();
    assert!(second.is_registered());
    assert!(gov.is_registered(&id("A5")).unwrap());
    assert!(!gov.has_stakes(&id("A5")).unwrap());
}

#[test]
fn unfunded_airline_cannot_register_another() {
    let (surety, _stream) = surety();
    let gov = surety.governance();
    gov.register_airline(&id("A2"), &id("A1")).unwrap();
    let err = gov.register_airline(&id("A3"), &id("A2")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);

    // Once funded, the same call succeeds.
    gov.add_stake(&id("A2"), Amount(110)).unwrap();
    assert!(gov.has_stakes(&id("A2")).unwrap());
    assert!(gov.register_airline(&id("A3"), &id("A2")).unwrap().is_registered());
}

// ---------------------------------------------------------------------------
// Insurance payout through oracle consensus
// ---------------------------------------------------------------------------

#[test]
fn airline_delay_credits_passenger_three_halves() {
    let (surety, mut stream) = surety();
    let flight = insured_flight(&surety, &[("P", 10)]);
    drain(&mut stream);

    let (_, outcome) = resolve(&surety, &flight, FlightStatus::LateAirline);
    match outcome {
        ResponseOutcome::Resolved { status, credited } => {
            assert_eq!(status, FlightStatus::LateAirline);
            let summary = credited.unwrap();
            assert_eq!(summary.policies, 1);
            assert_eq!(summary.total, Amount(15));
        }
        other => panic!("expected resolution, got {other:?}"),
    }

    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(15));
    let record = surety.insurance().flight(&flight).unwrap().unwrap();
    assert_eq!(record.status, FlightStatus::LateAirline);

    let events = drain(&mut stream);
    assert!(events.contains(&SuretyEvent::FlightStatusResolved {
        flight: flight.clone(),
        status: FlightStatus::LateAirline,
    }));
    assert!(events.contains(&SuretyEvent::InsureesCredited {
        flight,
        policies: 1,
        total: Amount(15),
    }));
}

#[test]
fn one_unit_premium_truncates() {
    let (surety, _stream) = surety();
    let flight = insured_flight(&surety, &[("P", 1)]);
    resolve(&surety, &flight, FlightStatus::LateAirline);
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(1));
}

#[test]
fn weather_delay_pays_nothing() {
    let (surety, _stream) = surety();
    let flight = insured_flight(&surety, &[("P", 10)]);
    let (_, outcome) = resolve(&surety, &flight, FlightStatus::LateWeather);
    assert_eq!(
        outcome,
        ResponseOutcome::Resolved {
            status: FlightStatus::LateWeather,
            credited: None
        }
    );
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount::ZERO);
}

#[test]
fn second_resolution_does_not_credit_twice() {
    let (surety, _stream) = surety();
    let flight = insured_flight(&surety, &[("P", 10), ("Q", 4)]);
    resolve(&surety, &flight, FlightStatus::LateAirline);
    assert_eq!(surety.insurance().credit_balance(&id("Q")).unwrap(), Amount(6));

    // A later request under another key resolves the same way.
    loop {
        let key = surety.oracles().fetch_flight_status(&flight, &id("P")).unwrap();
        let request = surety.oracles().request(&key).unwrap().unwrap();
        if !request.is_open() {
            continue;
        }
        let oracles = oracles_for(&surety, key.index, 3);
        for oracle in &oracles {
            surety
                .oracles()
                .submit_oracle_response(key.index, &flight, FlightStatus::LateAirline, oracle)
                .unwrap();
        }
        break;
    }
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(15));
    assert_eq!(surety.insurance().credit_balance(&id("Q")).unwrap(), Amount(6));
}

#[test]
fn responses_after_resolution_are_ignored() {
    let (surety, _stream) = surety();
    let flight = insured_flight(&surety, &[("P", 10)]);
    let (index, _) = resolve(&surety, &flight, FlightStatus::LateAirline);
    let late = oracles_for(&surety, index, 1);
    let outcome = surety
        .oracles()
        .submit_oracle_response(index, &flight, FlightStatus::LateAirline, &late[0])
        .unwrap();
    assert_eq!(
        outcome,
        ResponseOutcome::AlreadyResolved {
            status: FlightStatus::LateAirline
        }
    );
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(15));
}

// ---------------------------------------------------------------------------
// Withdrawal
// ---------------------------------------------------------------------------

#[derive(Default)]
struct RecordingRail {
    paid: Mutex<Vec<Amount>>,
}

impl SettlementRail for RecordingRail {
    fn transfer(&self, _to: &AccountId, amount: Amount) -> Result<(), RailError> {
        self.paid.lock().unwrap().push(amount);
        Ok(())
    }
}

/// Rail that tries to withdraw again while the first transfer is in flight.
struct ReentrantRail {
    surety: Arc<FlightSurety>,
    nested: Mutex<Vec<Result<Amount, SuretyError>>>,
    paid: Mutex<Vec<Amount>>,
}

impl SettlementRail for ReentrantRail {
    fn transfer(&self, to: &AccountId, amount: Amount) -> Result<(), RailError> {
        let observed = self.surety.insurance().credit_balance(to);
        assert_eq!(observed, Ok(Amount::ZERO));
        if self.nested.lock().unwrap().is_empty() {
            let nested = self.surety.insurance().withdraw_credits(to, self);
            self.nested.lock().unwrap().push(nested);
        }
        self.paid.lock().unwrap().push(amount);
        Ok(())
    }
}

#[test]
fn reentrant_withdrawal_sees_zero_balance() {
    let (surety, _stream) = surety();
    let surety = Arc::new(surety);
    let flight = insured_flight(&surety, &[("P", 10)]);
    resolve(&surety, &flight, FlightStatus::LateAirline);

    let rail = ReentrantRail {
        surety: surety.clone(),
        nested: Mutex::new(Vec::new()),
        paid: Mutex::new(Vec::new()),
    };
    let paid = surety.insurance().withdraw_credits(&id("P"), &rail).unwrap();
    assert_eq!(paid, Amount(15));

    let nested = rail.nested.lock().unwrap();
    assert_eq!(nested.len(), 1);
    assert_eq!(
        nested[0].as_ref().unwrap_err().kind(),
        ErrorKind::InsufficientCredit
    );
    assert_eq!(*rail.paid.lock().unwrap(), vec![Amount(15)]);
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount::ZERO);
}

// ---------------------------------------------------------------------------
// Operational gate
// ---------------------------------------------------------------------------

#[test]
fn paused_contract_rejects_every_mutation() {
    let (surety, mut stream) = surety();
    let flight = insured_flight(&surety, &[("P", 10)]);
    resolve(&surety, &flight, FlightStatus::LateAirline);
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(15));
    let fee = surety.config().registration_fee();
    surety.oracles().register_oracle(&id("O"), fee).unwrap();
    drain(&mut stream);

    let err = surety
        .gate()
        .set_operating_status(false, &id("A1"))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    surety.gate().set_operating_status(false, &id("admin")).unwrap();
    drain(&mut stream);

    let paused = |result: ErrorKind| assert_eq!(result, ErrorKind::ContractPaused);
    paused(
        surety
            .governance()
            .register_airline(&id("A2"), &id("A1"))
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .governance()
            .add_stake(&id("A1"), Amount(100))
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .insurance()
            .register_flight(&id("A1"), "ND2", 1, &id("A1"))
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .insurance()
            .buy_insurance(&flight, &id("Q"), Amount(1))
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .insurance()
            .withdraw_credits(&id("P"), &RecordingRail::default())
            .unwrap_err()
            .kind(),
    );
    assert_eq!(surety.insurance().credit_balance(&id("P")).unwrap(), Amount(15));
    paused(
        surety
            .oracles()
            .register_oracle(&id("O2"), fee)
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .oracles()
            .fetch_flight_status(&flight, &id("P"))
            .unwrap_err()
            .kind(),
    );
    paused(
        surety
            .oracles()
            .submit_oracle_response(0, &flight, FlightStatus::OnTime, &id("O"))
            .unwrap_err()
            .kind(),
    );
    assert!(drain(&mut stream).is_empty());

    surety.gate().set_operating_status(true, &id("admin")).unwrap();
    surety
        .insurance()
        .buy_insurance(&flight, &id("Q"), Amount(1))
        .unwrap();
    let rail = RecordingRail::default();
    assert_eq!(
        surety.insurance().withdraw_credits(&id("P"), &rail).unwrap(),
        Amount(15)
    );
    assert_eq!(*rail.paid.lock().unwrap(), vec![Amount(15)]);
}
