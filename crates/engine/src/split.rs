//! Split computation and validation.
//!
//! An expense total is divided among participants either by explicit
//! per-participant amounts or by percentages. [`compute_splits`] validates a
//! proposed split against its strategy and produces the final per-participant
//! shares, guaranteeing that the computed amounts always sum **exactly** to
//! the total: with the percentage strategy every share except the last is
//! rounded half-up on its own, and the last participant in input order takes
//! the residual.
//!
//! The function is pure apart from read-only lookups through a
//! [`ParticipantResolver`]; persistence, transactions and retries are the
//! caller's concern.

use thiserror::Error;
use uuid::Uuid;

use crate::{EngineError, MoneyCents, Percent, ResultEngine};

/// How an expense total is divided among its participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitStrategy {
    /// Every line declares an explicit amount; the amounts must sum to the
    /// expense total.
    Amount,
    /// Every line declares a percentage; the percentages must sum to exactly
    /// 100.0000.
    Percentage,
}

impl SplitStrategy {
    /// Returns the canonical strategy string used by the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Amount => "amount",
            Self::Percentage => "percentage",
        }
    }
}

impl TryFrom<&str> for SplitStrategy {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "amount" => Ok(Self::Amount),
            "percentage" => Ok(Self::Percentage),
            other => Err(EngineError::InvalidName(format!(
                "invalid split strategy: {other}"
            ))),
        }
    }
}

/// Whether a participant is a registered user or an external friend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantKind {
    User,
    Friend,
}

impl ParticipantKind {
    /// Returns the canonical kind string used by the database.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Friend => "friend",
        }
    }
}

impl TryFrom<&str> for ParticipantKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "friend" => Ok(Self::Friend),
            other => Err(EngineError::InvalidName(format!(
                "invalid participant kind: {other}"
            ))),
        }
    }
}

/// A validated participant reference: exactly one identifier, matching the
/// declared kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticipantRef {
    User(Uuid),
    Friend(Uuid),
}

impl ParticipantRef {
    #[must_use]
    pub fn kind(self) -> ParticipantKind {
        match self {
            Self::User(_) => ParticipantKind::User,
            Self::Friend(_) => ParticipantKind::Friend,
        }
    }

    #[must_use]
    pub fn id(self) -> Uuid {
        match self {
            Self::User(id) | Self::Friend(id) => id,
        }
    }
}

/// One participant's proposed share, before computation.
///
/// The identifier fields mirror the wire shape: the boundary is expected to
/// send exactly one of them, matching `kind`, but the engine re-checks the
/// pairing itself before trusting it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SplitLine {
    pub kind: ParticipantKind,
    pub user_id: Option<Uuid>,
    pub friend_id: Option<Uuid>,
    /// Required iff the strategy is [`SplitStrategy::Amount`].
    pub amount: Option<MoneyCents>,
    /// Required iff the strategy is [`SplitStrategy::Percentage`].
    pub percent: Option<Percent>,
}

impl SplitLine {
    /// A line for a registered user.
    #[must_use]
    pub fn user(user_id: Uuid) -> Self {
        Self {
            kind: ParticipantKind::User,
            user_id: Some(user_id),
            friend_id: None,
            amount: None,
            percent: None,
        }
    }

    /// A line for an external friend.
    #[must_use]
    pub fn friend(friend_id: Uuid) -> Self {
        Self {
            kind: ParticipantKind::Friend,
            user_id: None,
            friend_id: Some(friend_id),
            amount: None,
            percent: None,
        }
    }

    #[must_use]
    pub fn amount(mut self, amount: MoneyCents) -> Self {
        self.amount = Some(amount);
        self
    }

    #[must_use]
    pub fn percent(mut self, percent: Percent) -> Self {
        self.percent = Some(percent);
        self
    }

    /// Re-checks the kind/identifier pairing and returns the tagged
    /// reference.
    fn participant(&self) -> Result<ParticipantRef, SplitError> {
        match (self.kind, self.user_id, self.friend_id) {
            (ParticipantKind::User, Some(id), None) => Ok(ParticipantRef::User(id)),
            (ParticipantKind::Friend, None, Some(id)) => Ok(ParticipantRef::Friend(id)),
            (ParticipantKind::User, ..) => Err(SplitError::InvalidParticipant(
                "user participant requires exactly user_id".to_string(),
            )),
            (ParticipantKind::Friend, ..) => Err(SplitError::InvalidParticipant(
                "friend participant requires exactly friend_id".to_string(),
            )),
        }
    }
}

/// The finalized share of one participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ComputedShare {
    pub participant: ParticipantRef,
    pub amount: MoneyCents,
    /// The declared percentage, echoed verbatim; `None` for amount splits.
    pub percent: Option<Percent>,
}

/// Split validation failures.
///
/// Each variant is a deterministic function of the input: retrying with the
/// same input reproduces the same failure.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum SplitError {
    #[error("split must have at least one participant")]
    EmptySplit,
    #[error("invalid participant: {0}")]
    InvalidParticipant(String),
    #[error("share amount is required for amount splits")]
    MissingAmount,
    #[error("share percentage is required for percentage splits")]
    MissingPercentage,
    #[error("split amounts sum to {declared}, expected {total}")]
    AmountMismatch {
        declared: MoneyCents,
        total: MoneyCents,
    },
    #[error("split percentages sum to {declared}, expected {}", Percent::ONE_HUNDRED)]
    PercentageMismatch { declared: Percent },
}

/// Result of a friend lookup: the friend row may exist but belong to another
/// account, which is just as invalid for splitting purposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FriendAccess {
    pub exists: bool,
    pub owned_by_caller: bool,
}

/// Read-only lookup capability used to confirm participant references.
///
/// The production implementation reads the users/friends tables inside the
/// caller's open database transaction; tests use in-memory sets. The engine
/// performs no batching or caching of resolver calls.
#[allow(async_fn_in_trait)]
pub trait ParticipantResolver {
    /// Whether a registered user with this id exists. Any registered user may
    /// be named as a participant; ownership is not restricted.
    async fn user_exists(&self, user_id: Uuid) -> ResultEngine<bool>;

    /// Whether a friend with this id exists and is owned by the requesting
    /// account.
    async fn friend_access(&self, friend_id: Uuid) -> ResultEngine<FriendAccess>;
}

/// Validates a proposed split and computes the final per-participant shares.
///
/// The output corresponds 1:1, in the same order, to `lines`. On success the
/// share amounts sum exactly to `total`; for the percentage strategy the last
/// participant absorbs the rounding residual.
pub async fn compute_splits(
    total: MoneyCents,
    strategy: SplitStrategy,
    lines: &[SplitLine],
    resolver: &impl ParticipantResolver,
) -> ResultEngine<Vec<ComputedShare>> {
    if lines.is_empty() {
        return Err(SplitError::EmptySplit.into());
    }

    let mut participants = Vec::with_capacity(lines.len());
    for line in lines {
        let participant = line.participant()?;
        match participant {
            ParticipantRef::User(user_id) => {
                if !resolver.user_exists(user_id).await? {
                    return Err(SplitError::InvalidParticipant(format!(
                        "unknown user {user_id}"
                    ))
                    .into());
                }
            }
            ParticipantRef::Friend(friend_id) => {
                let access = resolver.friend_access(friend_id).await?;
                if !access.exists || !access.owned_by_caller {
                    return Err(SplitError::InvalidParticipant(format!(
                        "unknown or foreign friend {friend_id}"
                    ))
                    .into());
                }
            }
        }
        participants.push(participant);
    }

    match strategy {
        SplitStrategy::Amount => {
            let mut declared = MoneyCents::ZERO;
            let mut amounts = Vec::with_capacity(lines.len());
            for line in lines {
                let amount = line.amount.ok_or(SplitError::MissingAmount)?;
                declared = declared
                    .checked_add(amount)
                    .ok_or_else(|| EngineError::InvalidAmount("split amounts overflow".to_string()))?;
                amounts.push(amount);
            }
            if declared != total {
                return Err(SplitError::AmountMismatch { declared, total }.into());
            }

            Ok(participants
                .into_iter()
                .zip(amounts)
                .map(|(participant, amount)| ComputedShare {
                    participant,
                    amount,
                    percent: None,
                })
                .collect())
        }
        SplitStrategy::Percentage => {
            let mut declared = Percent::ZERO;
            let mut percents = Vec::with_capacity(lines.len());
            for line in lines {
                let percent = line.percent.ok_or(SplitError::MissingPercentage)?;
                declared = declared.checked_add(percent).ok_or_else(|| {
                    EngineError::InvalidAmount("split percentages overflow".to_string())
                })?;
                percents.push(percent);
            }
            if declared != Percent::ONE_HUNDRED {
                return Err(SplitError::PercentageMismatch { declared }.into());
            }

            let last = lines.len() - 1;
            let mut running = MoneyCents::ZERO;
            let mut shares = Vec::with_capacity(lines.len());
            for (idx, (participant, percent)) in
                participants.into_iter().zip(percents).enumerate()
            {
                let amount = if idx == last {
                    // Residual, not the line's own rounded share: the order
                    // dependence is what keeps the sum exact.
                    total - running
                } else {
                    let amount = percent.share_of(total).ok_or_else(|| {
                        EngineError::InvalidAmount("split share overflow".to_string())
                    })?;
                    running = running.checked_add(amount).ok_or_else(|| {
                        EngineError::InvalidAmount("split shares overflow".to_string())
                    })?;
                    amount
                };
                shares.push(ComputedShare {
                    participant,
                    amount,
                    percent: Some(percent),
                });
            }
            Ok(shares)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticResolver {
        users: Vec<Uuid>,
        owned_friends: Vec<Uuid>,
        foreign_friends: Vec<Uuid>,
    }

    impl StaticResolver {
        fn users(users: &[Uuid]) -> Self {
            Self {
                users: users.to_vec(),
                owned_friends: Vec::new(),
                foreign_friends: Vec::new(),
            }
        }
    }

    impl ParticipantResolver for StaticResolver {
        async fn user_exists(&self, user_id: Uuid) -> ResultEngine<bool> {
            Ok(self.users.contains(&user_id))
        }

        async fn friend_access(&self, friend_id: Uuid) -> ResultEngine<FriendAccess> {
            let owned = self.owned_friends.contains(&friend_id);
            Ok(FriendAccess {
                exists: owned || self.foreign_friends.contains(&friend_id),
                owned_by_caller: owned,
            })
        }
    }

    fn split_err(result: ResultEngine<Vec<ComputedShare>>) -> SplitError {
        match result {
            Err(EngineError::Split(err)) => err,
            other => panic!("expected split error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn amount_split_passes_amounts_through() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let lines = [
            SplitLine::user(alice).amount(MoneyCents::new(60_00)),
            SplitLine::user(alice).amount(MoneyCents::new(40_00)),
        ];

        let shares = compute_splits(
            MoneyCents::new(100_00),
            SplitStrategy::Amount,
            &lines,
            &resolver,
        )
        .await
        .unwrap();

        assert_eq!(shares.len(), 2);
        assert_eq!(shares[0].amount, MoneyCents::new(60_00));
        assert_eq!(shares[1].amount, MoneyCents::new(40_00));
        assert!(shares.iter().all(|s| s.percent.is_none()));
        assert!(
            shares
                .iter()
                .all(|s| s.participant == ParticipantRef::User(alice))
        );
    }

    #[tokio::test]
    async fn amount_split_requires_exact_sum() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let total = MoneyCents::new(100_00);

        let short = [
            SplitLine::user(alice).amount(MoneyCents::new(30_00)),
            SplitLine::user(alice).amount(MoneyCents::new(40_00)),
        ];
        assert_eq!(
            split_err(compute_splits(total, SplitStrategy::Amount, &short, &resolver).await),
            SplitError::AmountMismatch {
                declared: MoneyCents::new(70_00),
                total,
            }
        );

        // Off by a single cent is still a mismatch.
        let off_by_one = [
            SplitLine::user(alice).amount(MoneyCents::new(60_00)),
            SplitLine::user(alice).amount(MoneyCents::new(39_99)),
        ];
        assert!(matches!(
            split_err(compute_splits(total, SplitStrategy::Amount, &off_by_one, &resolver).await),
            SplitError::AmountMismatch { .. }
        ));
    }

    #[tokio::test]
    async fn percentage_split_rounds_deterministically() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let lines = [
            SplitLine::user(alice).percent(Percent::from_e4(33_3333)),
            SplitLine::user(alice).percent(Percent::from_e4(33_3333)),
            SplitLine::user(alice).percent(Percent::from_e4(33_3334)),
        ];

        let shares = compute_splits(
            MoneyCents::new(100_00),
            SplitStrategy::Percentage,
            &lines,
            &resolver,
        )
        .await
        .unwrap();

        let amounts: Vec<i64> = shares.iter().map(|s| s.amount.cents()).collect();
        assert_eq!(amounts, vec![33_33, 33_33, 33_34]);
        assert_eq!(shares[2].percent, Some(Percent::from_e4(33_3334)));
    }

    #[tokio::test]
    async fn last_line_absorbs_residual_regardless_of_its_percentage() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        // 33.3333% of 0.05 rounds to 0.02 twice, leaving only 0.01 for the
        // last line even though it declared the largest percentage.
        let lines = [
            SplitLine::user(alice).percent(Percent::from_e4(33_3333)),
            SplitLine::user(alice).percent(Percent::from_e4(33_3333)),
            SplitLine::user(alice).percent(Percent::from_e4(33_3334)),
        ];

        let shares = compute_splits(
            MoneyCents::new(5),
            SplitStrategy::Percentage,
            &lines,
            &resolver,
        )
        .await
        .unwrap();

        let amounts: Vec<i64> = shares.iter().map(|s| s.amount.cents()).collect();
        assert_eq!(amounts, vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn share_amounts_always_sum_to_total() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let distributions: &[&[i64]] = &[
            &[100_0000],
            &[1_0000, 99_0000],
            &[33_3333, 33_3333, 33_3334],
            &[14_2857, 14_2857, 14_2857, 14_2857, 14_2857, 14_2858, 14_2857],
            &[0, 50_0000, 50_0000],
        ];

        for total_cents in [1, 3, 99, 100_00, 12_345_678] {
            let total = MoneyCents::new(total_cents);
            for pcts in distributions {
                let lines: Vec<SplitLine> = pcts
                    .iter()
                    .map(|p| SplitLine::user(alice).percent(Percent::from_e4(*p)))
                    .collect();
                let shares =
                    compute_splits(total, SplitStrategy::Percentage, &lines, &resolver)
                        .await
                        .unwrap();

                let sum: i64 = shares.iter().map(|s| s.amount.cents()).sum();
                assert_eq!(sum, total_cents, "drift for {pcts:?} of {total}");
                assert_eq!(shares.len(), lines.len());
            }
        }
    }

    #[tokio::test]
    async fn percentage_sum_must_be_exactly_one_hundred() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let total = MoneyCents::new(100_00);

        for (a, b) in [(50_0000, 49_9999), (50_0000, 50_0001)] {
            let lines = [
                SplitLine::user(alice).percent(Percent::from_e4(a)),
                SplitLine::user(alice).percent(Percent::from_e4(b)),
            ];
            assert!(matches!(
                split_err(
                    compute_splits(total, SplitStrategy::Percentage, &lines, &resolver).await
                ),
                SplitError::PercentageMismatch { .. }
            ));
        }

        // Unevenly distributed but exact is fine.
        let uneven = [
            SplitLine::user(alice).percent(Percent::from_e4(1_0000)),
            SplitLine::user(alice).percent(Percent::from_e4(99_0000)),
        ];
        let shares = compute_splits(total, SplitStrategy::Percentage, &uneven, &resolver)
            .await
            .unwrap();
        assert_eq!(shares[0].amount, MoneyCents::new(1_00));
        assert_eq!(shares[1].amount, MoneyCents::new(99_00));
    }

    #[tokio::test]
    async fn empty_lines_are_rejected_for_both_strategies() {
        let resolver = StaticResolver::users(&[]);
        for strategy in [SplitStrategy::Amount, SplitStrategy::Percentage] {
            assert_eq!(
                split_err(compute_splits(MoneyCents::new(100), strategy, &[], &resolver).await),
                SplitError::EmptySplit
            );
        }
    }

    #[tokio::test]
    async fn missing_strategy_fields_are_rejected() {
        let alice = Uuid::new_v4();
        let resolver = StaticResolver::users(&[alice]);
        let total = MoneyCents::new(100);

        let no_amount = [SplitLine::user(alice).percent(Percent::ONE_HUNDRED)];
        assert_eq!(
            split_err(compute_splits(total, SplitStrategy::Amount, &no_amount, &resolver).await),
            SplitError::MissingAmount
        );

        let no_percent = [SplitLine::user(alice).amount(MoneyCents::new(100))];
        assert_eq!(
            split_err(
                compute_splits(total, SplitStrategy::Percentage, &no_percent, &resolver).await
            ),
            SplitError::MissingPercentage
        );
    }

    #[tokio::test]
    async fn foreign_friend_is_rejected_even_with_valid_math() {
        let theirs = Uuid::new_v4();
        let resolver = StaticResolver {
            users: Vec::new(),
            owned_friends: Vec::new(),
            foreign_friends: vec![theirs],
        };
        let lines = [SplitLine::friend(theirs).amount(MoneyCents::new(100))];

        assert!(matches!(
            split_err(
                compute_splits(MoneyCents::new(100), SplitStrategy::Amount, &lines, &resolver)
                    .await
            ),
            SplitError::InvalidParticipant(_)
        ));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let resolver = StaticResolver::users(&[]);
        let lines = [SplitLine::user(Uuid::new_v4()).amount(MoneyCents::new(100))];

        assert!(matches!(
            split_err(
                compute_splits(MoneyCents::new(100), SplitStrategy::Amount, &lines, &resolver)
                    .await
            ),
            SplitError::InvalidParticipant(_)
        ));
    }

    #[tokio::test]
    async fn malformed_identifier_pairings_are_rejected() {
        let alice = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let resolver = StaticResolver {
            users: vec![alice],
            owned_friends: vec![friend],
            foreign_friends: Vec::new(),
        };

        // user kind carrying a friend id, both ids set, and no id at all
        let mut both = SplitLine::user(alice).amount(MoneyCents::new(100));
        both.friend_id = Some(friend);
        let mut swapped = SplitLine::friend(friend).amount(MoneyCents::new(100));
        swapped.user_id = Some(alice);
        swapped.friend_id = None;
        let mut none = SplitLine::user(alice).amount(MoneyCents::new(100));
        none.user_id = None;

        for line in [both, swapped, none] {
            assert!(matches!(
                split_err(
                    compute_splits(
                        MoneyCents::new(100),
                        SplitStrategy::Amount,
                        &[line],
                        &resolver
                    )
                    .await
                ),
                SplitError::InvalidParticipant(_)
            ));
        }
    }

    #[tokio::test]
    async fn identical_input_yields_identical_output() {
        let alice = Uuid::new_v4();
        let friend = Uuid::new_v4();
        let resolver = StaticResolver {
            users: vec![alice],
            owned_friends: vec![friend],
            foreign_friends: Vec::new(),
        };
        let lines = [
            SplitLine::user(alice).percent(Percent::from_e4(62_5000)),
            SplitLine::friend(friend).percent(Percent::from_e4(37_5000)),
        ];
        let total = MoneyCents::new(99_99);

        let first = compute_splits(total, SplitStrategy::Percentage, &lines, &resolver)
            .await
            .unwrap();
        let second = compute_splits(total, SplitStrategy::Percentage, &lines, &resolver)
            .await
            .unwrap();
        assert_eq!(first, second);
    }
}
