use review_ledger::{AdminBootstrap, LedgerError, ProgramKey, ReviewLedger};
use score_core::{AccountId, BadgeId, Hex32, ScaledU128, ScorerId};
use score_set::ScoreSet;

fn badge(n: u8) -> BadgeId {
    let mut raw = [0u8; 32];
    raw[31] = n;
    Hex32(raw)
}

fn subject(n: u8) -> Hex32 {
    let mut raw = [0u8; 32];
    raw[0] = n;
    Hex32(raw)
}

fn owner() -> AccountId {
    AccountId::new("acc-owner")
}

fn submitter() -> AccountId {
    AccountId::new("acc-submitter")
}

struct Fixture {
    _tmp: tempfile::TempDir,
    ledger: ReviewLedger,
    set: ScoreSet,
    scorer_id: ScorerId,
}

/// Scorer with badges 1..=5 (weight 1 each) at the given decimals, bound to
/// a fresh ledger.
fn fixture(decimals: u8) -> Fixture {
    let tmp = tempfile::tempdir().expect("tempdir");
    let set = ScoreSet::open(tmp.path().join("scorers")).expect("open score set");
    let badges: Vec<BadgeId> = (1..=5).map(badge).collect();
    let scorer_id = set
        .register_scorer(
            AccountId::new("acc-manager"),
            None,
            &badges,
            &[1, 1, 1, 1, 1],
            decimals,
            String::new(),
        )
        .expect("register scorer");

    let ledger = ReviewLedger::open(
        tmp.path().join("ledger"),
        AdminBootstrap {
            owner: owner(),
            authorized_submitter: submitter(),
        },
    )
    .expect("open ledger");
    ledger
        .set_scorer_binding(scorer_id, &owner())
        .expect("bind scorer");

    Fixture {
        _tmp: tmp,
        ledger,
        set,
        scorer_id,
    }
}

fn submit(
    f: &Fixture,
    subject_id: Hex32,
    program: &ProgramKey,
    scores: &[u8],
) -> Result<review_ledger::ProgramAggregateV1, LedgerError> {
    let badge_ids: Vec<BadgeId> = (1..=scores.len() as u8).map(badge).collect();
    f.ledger.submit_review(
        &f.set,
        &submitter(),
        subject_id,
        Hex32([0xEE; 32]),
        program,
        &badge_ids,
        scores,
        1_700_000_000,
    )
}

#[test]
fn submission_requires_the_authorized_submitter() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");
    let err = f
        .ledger
        .submit_review(
            &f.set,
            &AccountId::new("acc-stranger"),
            subject(1),
            Hex32([0xEE; 32]),
            &program,
            &[badge(1)],
            &[4],
            0,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)), "{err}");
    assert_eq!(f.ledger.get_story_count(subject(1)).unwrap(), 0);
}

#[test]
fn submission_requires_a_bound_scorer() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let set = ScoreSet::open(tmp.path().join("scorers")).unwrap();
    let ledger = ReviewLedger::open(
        tmp.path().join("ledger"),
        AdminBootstrap {
            owner: owner(),
            authorized_submitter: submitter(),
        },
    )
    .unwrap();

    let err = ledger
        .submit_review(
            &set,
            &submitter(),
            subject(1),
            Hex32([0xEE; 32]),
            &ProgramKey::new("prog-a"),
            &[badge(1)],
            &[4],
            0,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::ScorerNotBound), "{err}");
}

#[test]
fn submission_validates_badges_and_shapes() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    let err = f
        .ledger
        .submit_review(
            &f.set,
            &submitter(),
            subject(1),
            Hex32([0xEE; 32]),
            &program,
            &[badge(1), badge(2)],
            &[4],
            0,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::LengthMismatch { .. }), "{err}");

    let err = f
        .ledger
        .submit_review(
            &f.set,
            &submitter(),
            subject(1),
            Hex32([0xEE; 32]),
            &program,
            &[],
            &[],
            0,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::EmptyReview), "{err}");

    let err = f
        .ledger
        .submit_review(
            &f.set,
            &submitter(),
            subject(1),
            Hex32([0xEE; 32]),
            &program,
            &[badge(99)],
            &[4],
            0,
        )
        .unwrap_err();
    assert!(matches!(err, LedgerError::UnknownBadge(b) if b == badge(99)), "{err}");

    // Nothing was committed by the failed submissions.
    assert_eq!(f.ledger.get_story_count(subject(1)).unwrap(), 0);
    assert_eq!(f.ledger.get_review_counts(&program).unwrap(), (0, 0));
}

#[test]
fn first_review_sets_the_aggregate() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    assert!(matches!(
        f.ledger.get_average_score(&program).unwrap_err(),
        LedgerError::NotReviewed(_)
    ));

    let agg = submit(&f, subject(1), &program, &[4]).unwrap();
    assert_eq!(agg.total_review_count, 1);
    assert_eq!(agg.valid_review_count, 1);
    assert_eq!(agg.running_average, ScaledU128(4));
    assert_eq!(f.ledger.get_average_score(&program).unwrap(), ScaledU128(4));
}

#[test]
fn story_average_is_ceiling_rounded_and_scaled() {
    let f = fixture(2);
    let program = ProgramKey::new("prog-a");

    // sum = 3, scale = 100: ceil(300 / 2) = 150.
    let agg = submit(&f, subject(1), &program, &[1, 2]).unwrap();
    assert_eq!(agg.running_average, ScaledU128(150));

    let story = f.ledger.get_story(subject(1), 0).unwrap();
    assert_eq!(story.average_score, ScaledU128(150));
    assert_eq!(story.scores, vec![1, 2]);
}

#[test]
fn second_subject_folds_into_the_mean() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    submit(&f, subject(1), &program, &[4]).unwrap(); // X = 4
    let agg = submit(&f, subject(2), &program, &[1]).unwrap(); // Y = 1

    // ceil((4 + 1) / 2) = 3
    assert_eq!(agg.total_review_count, 2);
    assert_eq!(agg.valid_review_count, 2);
    assert_eq!(agg.running_average, ScaledU128(3));
}

#[test]
fn sole_contributor_revision_overwrites() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    submit(&f, subject(1), &program, &[4]).unwrap();
    let agg = submit(&f, subject(1), &program, &[1]).unwrap();

    assert_eq!(agg.total_review_count, 2);
    assert_eq!(agg.valid_review_count, 1);
    assert_eq!(agg.running_average, ScaledU128(1));
    assert_eq!(f.ledger.get_story_count(subject(1)).unwrap(), 2);
}

#[test]
fn general_revision_replaces_only_this_subjects_contribution() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    submit(&f, subject(1), &program, &[4]).unwrap(); // S1 -> 4
    submit(&f, subject(2), &program, &[2]).unwrap(); // S2 -> 2, avg ceil(6/2)=3

    // S1 revises to avg 1: back out 4 (prior' = ceil((6-4)/1) = 2), fold 1:
    // ceil((2+1)/2) = 2.
    let agg = submit(&f, subject(1), &program, &[1, 1]).unwrap();
    assert_eq!(agg.total_review_count, 3);
    assert_eq!(agg.valid_review_count, 2);
    assert_eq!(agg.running_average, ScaledU128(2));

    // Prior stories are untouched.
    let first = f.ledger.get_story(subject(1), 0).unwrap();
    assert_eq!(first.average_score, ScaledU128(4));
    let stories = f.ledger.get_stories(subject(1)).unwrap();
    assert_eq!(stories.len(), 2);
    assert_eq!(stories[1].average_score, ScaledU128(1));
}

#[test]
fn aggregates_are_scoped_per_program() {
    let f = fixture(0);
    let prog_a = ProgramKey::new("prog-a");
    let prog_b = ProgramKey::new("prog-b");

    submit(&f, subject(1), &prog_a, &[4]).unwrap();
    submit(&f, subject(2), &prog_b, &[2]).unwrap();

    assert_eq!(f.ledger.get_review_counts(&prog_a).unwrap(), (1, 1));
    assert_eq!(f.ledger.get_review_counts(&prog_b).unwrap(), (1, 1));
    assert_eq!(f.ledger.get_average_score(&prog_a).unwrap(), ScaledU128(4));
    assert_eq!(f.ledger.get_average_score(&prog_b).unwrap(), ScaledU128(2));
}

#[test]
fn first_review_of_a_second_program_folds_as_new_contributor() {
    let f = fixture(0);
    let prog_a = ProgramKey::new("prog-a");
    let prog_b = ProgramKey::new("prog-b");

    // S1 has history under prog-a; S2 is prog-b's sole contributor.
    submit(&f, subject(1), &prog_a, &[4]).unwrap();
    submit(&f, subject(2), &prog_b, &[2]).unwrap();

    // S1's first prog-b review joins as a new contributor, not a revision:
    // ceil((2 + 4) / 2) = 3 with two valid reviews.
    let agg = submit(&f, subject(1), &prog_b, &[4]).unwrap();
    assert_eq!(agg.total_review_count, 2);
    assert_eq!(agg.valid_review_count, 2);
    assert_eq!(agg.running_average, ScaledU128(3));

    // A further prog-b review from S1 is a revision there, backing out 4:
    // prior' = ceil((6 - 4) / 1) = 2, then ceil((2 + 2) / 2) = 2.
    let agg = submit(&f, subject(1), &prog_b, &[2]).unwrap();
    assert_eq!(agg.total_review_count, 3);
    assert_eq!(agg.valid_review_count, 2);
    assert_eq!(agg.running_average, ScaledU128(2));

    // prog-a is untouched by any of it.
    assert_eq!(f.ledger.get_review_counts(&prog_a).unwrap(), (1, 1));
    assert_eq!(f.ledger.get_average_score(&prog_a).unwrap(), ScaledU128(4));
}

#[test]
fn get_story_out_of_range() {
    let f = fixture(0);
    submit(&f, subject(1), &ProgramKey::new("prog-a"), &[4]).unwrap();

    let err = f.ledger.get_story(subject(1), 1).unwrap_err();
    assert!(
        matches!(err, LedgerError::OutOfRange { index: 1, count: 1, .. }),
        "{err}"
    );
}

#[test]
fn score_of_uses_the_two_value_convention() {
    let f = fixture(0);
    let program = ProgramKey::new("prog-a");

    assert_eq!(f.ledger.score_of(b"prog-a"), (false, 0));
    assert_eq!(f.ledger.score_of(&[0xFF, 0xFE]), (false, 0));
    assert_eq!(f.ledger.score_of(b""), (false, 0));

    submit(&f, subject(1), &program, &[4]).unwrap();
    assert_eq!(f.ledger.score_of(b"prog-a"), (true, 4));
}

#[test]
fn admin_operations_are_owner_gated() {
    let f = fixture(0);
    let stranger = AccountId::new("acc-stranger");

    assert!(matches!(
        f.ledger.set_scorer_binding(f.scorer_id, &stranger).unwrap_err(),
        LedgerError::NotOwner(_)
    ));
    assert!(matches!(
        f.ledger
            .set_authorized_submitter(&stranger, &stranger)
            .unwrap_err(),
        LedgerError::NotOwner(_)
    ));

    // The owner can rotate the submitter; the old submitter is locked out.
    let new_submitter = AccountId::new("acc-submitter-2");
    f.ledger
        .set_authorized_submitter(&new_submitter, &owner())
        .unwrap();
    let err = submit(&f, subject(1), &ProgramKey::new("prog-a"), &[4]).unwrap_err();
    assert!(matches!(err, LedgerError::NotAuthorized(_)));

    // Ownership transfer hands off admin rights.
    let new_owner = AccountId::new("acc-owner-2");
    f.ledger.set_owner(&new_owner, &owner()).unwrap();
    assert!(matches!(
        f.ledger.set_owner(&owner(), &owner()).unwrap_err(),
        LedgerError::NotOwner(_)
    ));
    f.ledger
        .set_authorized_submitter(&submitter(), &new_owner)
        .unwrap();
}

#[test]
fn stepwise_recurrence_over_a_mixed_sequence() {
    // Replays a mixed first-time/revision sequence and checks the aggregate
    // against the recurrence computed independently at every step.
    let f = fixture(0);
    let program = ProgramKey::new("prog-mixed");

    let ceil_div = |a: u128, b: u128| if a == 0 { 0 } else { (a - 1) / b + 1 };

    // (subject, story scores)
    let steps: &[(u8, &[u8])] = &[
        (1, &[5]),
        (2, &[3]),
        (3, &[1, 2]),
        (2, &[4]),
        (1, &[2, 2, 2]),
        (3, &[5, 5]),
    ];

    let mut expected_avg = 0u128;
    let mut expected_valid = 0u128;
    let mut last_avg: std::collections::HashMap<u8, u128> = Default::default();

    for (i, (subj, scores)) in steps.iter().enumerate() {
        let sum: u128 = scores.iter().map(|s| u128::from(*s)).sum();
        let story_avg = ceil_div(sum, scores.len() as u128);

        let prior = last_avg.get(subj).copied();
        match prior {
            None if expected_valid == 0 => {
                expected_avg = story_avg;
                expected_valid = 1;
            }
            None => {
                expected_avg = ceil_div(
                    expected_avg * expected_valid + story_avg,
                    expected_valid + 1,
                );
                expected_valid += 1;
            }
            Some(_) if expected_valid == 1 => {
                expected_avg = story_avg;
            }
            Some(prev) => {
                let without = expected_avg * expected_valid - prev;
                let prior_mean = ceil_div(without, expected_valid - 1);
                expected_avg = ceil_div(
                    prior_mean * (expected_valid - 1) + story_avg,
                    expected_valid,
                );
            }
        }
        last_avg.insert(*subj, story_avg);

        let agg = submit(&f, subject(*subj), &program, scores).unwrap();
        assert_eq!(agg.total_review_count as usize, i + 1, "step {i}");
        assert_eq!(u128::from(agg.valid_review_count), expected_valid, "step {i}");
        assert_eq!(agg.running_average, ScaledU128(expected_avg), "step {i}");
    }
}
