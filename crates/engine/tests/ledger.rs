use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Currency, Engine, EngineError, ExpenseUpdate, MoneyCents};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for user in ["alice", "bob", "charlie", "dave"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password) VALUES (?, ?)",
            vec![user.into(), "password".into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder().database(db.clone()).build();
    (engine, db)
}

async fn trip_group(engine: &Engine) -> String {
    engine
        .new_group(
            "Trip",
            Some("weekend away"),
            Some(Currency::Inr),
            Some("travel"),
            "alice",
            &["bob".to_string(), "charlie".to_string()],
        )
        .await
        .unwrap()
}

async fn balance(engine: &Engine, group_id: &str, member: &str) -> i64 {
    engine
        .snapshot(group_id, "alice")
        .await
        .unwrap()
        .into_iter()
        .find_map(|(id, amount)| (id == member).then_some(amount.cents()))
        .unwrap()
}

#[tokio::test]
async fn new_group_starts_with_zero_balances_and_owner_as_member() {
    let (engine, _db) = engine_with_db().await;
    let group_id = engine
        .new_group("Flat", None, None, None, "alice", &["bob".to_string()])
        .await
        .unwrap();

    let (group, entries) = engine.group(&group_id, "alice").await.unwrap();
    assert_eq!(group.owner, "alice");
    assert_eq!(group.total_expenditure, MoneyCents::ZERO);

    let members: Vec<_> = entries.iter().map(|e| e.member_id.as_str()).collect();
    assert_eq!(members, vec!["alice", "bob"]);
    assert!(entries.iter().all(|e| e.amount.is_zero()));
}

#[tokio::test]
async fn expense_split_leaves_remainder_on_payer() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    engine
        .add_expense(
            &group_id,
            "Dinner",
            None,
            MoneyCents::new(10000),
            Some("food"),
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string(), "charlie".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &group_id, "alice").await, 6667);
    assert_eq!(balance(&engine, &group_id, "bob").await, -3333);
    assert_eq!(balance(&engine, &group_id, "charlie").await, -3333);

    // 10000 does not divide by 3; the payer keeps the rounding remainder.
    let total = engine.total_balance(&group_id).await.unwrap();
    assert_eq!(total, MoneyCents::new(1));

    let (group, _) = engine.group(&group_id, "alice").await.unwrap();
    assert_eq!(group.total_expenditure, MoneyCents::new(10000));
}

#[tokio::test]
async fn delete_expense_restores_previous_balances_exactly() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;
    let members = vec![
        "alice".to_string(),
        "bob".to_string(),
        "charlie".to_string(),
    ];

    engine
        .add_expense(
            &group_id,
            "Hotel",
            None,
            MoneyCents::new(9000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &members,
        )
        .await
        .unwrap();
    let before = engine.snapshot(&group_id, "alice").await.unwrap();

    let expense_id = engine
        .add_expense(
            &group_id,
            "Taxi",
            None,
            MoneyCents::new(10000),
            None,
            Utc::now(),
            "alice",
            "bob",
            &members,
        )
        .await
        .unwrap();
    engine
        .delete_expense(&group_id, expense_id, "alice")
        .await
        .unwrap();

    let after = engine.snapshot(&group_id, "alice").await.unwrap();
    assert_eq!(before, after);

    let (group, _) = engine.group(&group_id, "alice").await.unwrap();
    assert_eq!(group.total_expenditure, MoneyCents::new(9000));
}

#[tokio::test]
async fn update_expense_swaps_payer_in_one_step() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;
    let members = vec![
        "alice".to_string(),
        "bob".to_string(),
        "charlie".to_string(),
    ];

    let expense_id = engine
        .add_expense(
            &group_id,
            "Groceries",
            None,
            MoneyCents::new(9000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &members,
        )
        .await
        .unwrap();

    engine
        .update_expense(
            &group_id,
            expense_id,
            "alice",
            ExpenseUpdate {
                paid_by: Some("bob".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &group_id, "alice").await, -3000);
    assert_eq!(balance(&engine, &group_id, "bob").await, 6000);
    assert_eq!(balance(&engine, &group_id, "charlie").await, -3000);

    let expense = engine.expense(&group_id, expense_id, "alice").await.unwrap();
    assert_eq!(expense.paid_by, "bob");
    assert_eq!(expense.amount, MoneyCents::new(9000));
}

#[tokio::test]
async fn update_expense_amount_adjusts_total_expenditure() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;
    let members = vec!["alice".to_string(), "bob".to_string()];

    let expense_id = engine
        .add_expense(
            &group_id,
            "Tickets",
            None,
            MoneyCents::new(4000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &members,
        )
        .await
        .unwrap();

    engine
        .update_expense(
            &group_id,
            expense_id,
            "alice",
            ExpenseUpdate {
                amount: Some(MoneyCents::new(6000)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &group_id, "alice").await, 3000);
    assert_eq!(balance(&engine, &group_id, "bob").await, -3000);

    let (group, _) = engine.group(&group_id, "alice").await.unwrap();
    assert_eq!(group.total_expenditure, MoneyCents::new(6000));
}

#[tokio::test]
async fn settlement_moves_both_balances_and_persists() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    engine
        .add_expense(
            &group_id,
            "Lunch",
            None,
            MoneyCents::new(4000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();

    engine
        .record_settlement(
            &group_id,
            "bob",
            "bob",
            "alice",
            MoneyCents::new(2000),
            Utc::now(),
        )
        .await
        .unwrap();

    assert_eq!(balance(&engine, &group_id, "alice").await, 0);
    assert_eq!(balance(&engine, &group_id, "bob").await, 0);

    let settlements = engine.group_settlements(&group_id, "alice").await.unwrap();
    assert_eq!(settlements.len(), 1);
    assert_eq!(settlements[0].settle_from, "bob");
    assert_eq!(settlements[0].settle_to, "alice");
    assert_eq!(settlements[0].amount, MoneyCents::new(2000));
}

#[tokio::test]
async fn settlement_rejects_non_positive_amount_and_self_payment() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    let err = engine
        .record_settlement(&group_id, "alice", "bob", "alice", MoneyCents::ZERO, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));

    let err = engine
        .record_settlement(
            &group_id,
            "alice",
            "alice",
            "alice",
            MoneyCents::new(100),
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn balance_sheet_greedy_order() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    // Drive the ledger to a: +500, b: -200, c: -300 with two expenses.
    engine
        .add_expense(
            &group_id,
            "One",
            None,
            MoneyCents::new(400),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();
    engine
        .add_expense(
            &group_id,
            "Two",
            None,
            MoneyCents::new(600),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "charlie".to_string()],
        )
        .await
        .unwrap();

    let (entries, transfers) = engine.balance_sheet(&group_id, "alice").await.unwrap();
    let amounts: Vec<i64> = entries.iter().map(|e| e.amount.cents()).collect();
    assert_eq!(amounts, vec![500, -200, -300]);

    // Largest debtor pays first, then the rest.
    assert_eq!(transfers.len(), 2);
    assert_eq!(transfers[0].from, "charlie");
    assert_eq!(transfers[0].to, "alice");
    assert_eq!(transfers[0].amount, MoneyCents::new(300));
    assert_eq!(transfers[1].from, "bob");
    assert_eq!(transfers[1].to, "alice");
    assert_eq!(transfers[1].amount, MoneyCents::new(200));
}

#[tokio::test]
async fn balance_sheet_exact_match_with_bystander() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    // a: +250, b: -250, c: 0
    engine
        .add_expense(
            &group_id,
            "Pair",
            None,
            MoneyCents::new(500),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();

    let (_, transfers) = engine.balance_sheet(&group_id, "alice").await.unwrap();
    assert_eq!(transfers.len(), 1);
    assert_eq!(transfers[0].from, "bob");
    assert_eq!(transfers[0].to, "alice");
    assert_eq!(transfers[0].amount, MoneyCents::new(250));
}

#[tokio::test]
async fn settled_group_yields_no_transfers() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    let (_, transfers) = engine.balance_sheet(&group_id, "alice").await.unwrap();
    assert!(transfers.is_empty());
}

#[tokio::test]
async fn member_with_open_balance_cannot_be_removed() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    engine
        .add_expense(
            &group_id,
            "Lunch",
            None,
            MoneyCents::new(4000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();

    let err = engine
        .remove_member(&group_id, "alice", "bob")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NonZeroBalance(_)));

    engine
        .record_settlement(
            &group_id,
            "bob",
            "bob",
            "alice",
            MoneyCents::new(2000),
            Utc::now(),
        )
        .await
        .unwrap();
    engine.remove_member(&group_id, "alice", "bob").await.unwrap();

    let (_, entries) = engine.group(&group_id, "alice").await.unwrap();
    assert!(entries.iter().all(|e| e.member_id != "bob"));
}

#[tokio::test]
async fn add_member_twice_is_a_conflict() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    engine.add_member(&group_id, "alice", "dave").await.unwrap();
    let err = engine
        .add_member(&group_id, "alice", "dave")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::ExistingMember("dave".to_string()));
}

#[tokio::test]
async fn non_member_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    let err = engine.group(&group_id, "dave").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    let err = engine
        .add_expense(
            &group_id,
            "Sneaky",
            None,
            MoneyCents::new(100),
            None,
            Utc::now(),
            "dave",
            "dave",
            &["dave".to_string()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));
}

#[tokio::test]
async fn expense_for_non_member_participant_leaves_ledger_untouched() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    let err = engine
        .add_expense(
            &group_id,
            "Ghost",
            None,
            MoneyCents::new(900),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "dave".to_string()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MemberNotInGroup(_)));

    let snapshot = engine.snapshot(&group_id, "alice").await.unwrap();
    assert!(snapshot.iter().all(|(_, amount)| amount.is_zero()));
    assert!(engine.group_expenses(&group_id, "alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn user_expenses_spans_groups_and_respects_limit() {
    let (engine, _db) = engine_with_db().await;
    let first = trip_group(&engine).await;
    let second = engine
        .new_group("Flat", None, None, None, "bob", &["alice".to_string()])
        .await
        .unwrap();

    for (group, name) in [(&first, "Dinner"), (&second, "Rent"), (&first, "Taxi")] {
        engine
            .add_expense(
                group,
                name,
                None,
                MoneyCents::new(1000),
                None,
                Utc::now(),
                "alice",
                "alice",
                &["alice".to_string(), "bob".to_string()],
            )
            .await
            .unwrap();
    }

    let all = engine.user_expenses("alice", None).await.unwrap();
    assert_eq!(all.len(), 3);

    let limited = engine.user_expenses("alice", Some(2)).await.unwrap();
    assert_eq!(limited.len(), 2);
}

#[tokio::test]
async fn recent_expenses_skip_rows_without_the_user() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    // Alice's only expense is the oldest row; the newer rows in her group
    // don't include her and must not eat into her limit.
    let base = Utc::now();
    engine
        .add_expense(
            &group_id,
            "Breakfast",
            None,
            MoneyCents::new(600),
            None,
            base - chrono::Duration::hours(3),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string()],
        )
        .await
        .unwrap();
    for (name, hours_ago) in [("Museum", 2), ("Cab", 1)] {
        engine
            .add_expense(
                &group_id,
                name,
                None,
                MoneyCents::new(1000),
                None,
                base - chrono::Duration::hours(hours_ago),
                "bob",
                "bob",
                &["bob".to_string(), "charlie".to_string()],
            )
            .await
            .unwrap();
    }

    let recent = engine.user_expenses("alice", Some(2)).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].name, "Breakfast");
}

#[tokio::test]
async fn expense_with_duplicate_member_is_rejected() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    let err = engine
        .add_expense(
            &group_id,
            "Dinner",
            None,
            MoneyCents::new(3000),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string(), "bob".to_string()],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidSplit(_)));

    let snapshot = engine.snapshot(&group_id, "alice").await.unwrap();
    assert!(snapshot.iter().all(|(_, amount)| amount.is_zero()));
}

#[tokio::test]
async fn delete_group_removes_everything() {
    let (engine, _db) = engine_with_db().await;
    let group_id = trip_group(&engine).await;

    engine
        .add_expense(
            &group_id,
            "Lunch",
            None,
            MoneyCents::new(300),
            None,
            Utc::now(),
            "alice",
            "alice",
            &["alice".to_string(), "bob".to_string(), "charlie".to_string()],
        )
        .await
        .unwrap();

    let err = engine.delete_group(&group_id, "bob").await.unwrap_err();
    assert!(matches!(err, EngineError::Forbidden(_)));

    engine.delete_group(&group_id, "alice").await.unwrap();
    let err = engine.group(&group_id, "alice").await.unwrap_err();
    assert!(matches!(err, EngineError::GroupNotFound(_)));
    assert!(engine.groups_for_user("alice").await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_expense_adds_serialize_per_group() {
    let (engine, _db) = engine_with_db().await;
    let engine = Arc::new(engine);
    let group_id = trip_group(&engine).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&engine);
        let group_id = group_id.clone();
        handles.push(tokio::spawn(async move {
            engine
                .add_expense(
                    &group_id,
                    "Round",
                    None,
                    MoneyCents::new(300),
                    None,
                    Utc::now(),
                    "alice",
                    "alice",
                    &["alice".to_string(), "bob".to_string(), "charlie".to_string()],
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // 300 / 3 splits evenly, so every add is zero-sum and none may be lost.
    assert_eq!(balance(&engine, &group_id, "alice").await, 8 * 200);
    assert_eq!(balance(&engine, &group_id, "bob").await, -(8 * 100));
    assert_eq!(balance(&engine, &group_id, "charlie").await, -(8 * 100));

    let (group, _) = engine.group(&group_id, "alice").await.unwrap();
    assert_eq!(group.total_expenditure, MoneyCents::new(8 * 300));
}
