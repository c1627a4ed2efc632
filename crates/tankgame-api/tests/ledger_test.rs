//! Integration tests: points transfers, the XP ledger and cached user stats.

use tankgame_api::{Database, auth, points, stats, xp};
use tankgame_types::Status;
use tankgame_types::api::{AddXp, ChangePoints, RegisterRequest, UserStatsUpdate};

fn setup_user(email: &str) -> (Database, i64) {
    let db = Database::open_in_memory().unwrap();
    let env = auth::register(
        &db,
        &RegisterRequest {
            email: email.into(),
            password: "pw".into(),
        },
    );
    assert!(env.is_success());
    let id = db.get_user_by_email(email).unwrap().unwrap().id;
    (db, id)
}

#[test]
fn points_transfer_nets_to_zero() {
    let (db, user) = setup_user("a@b.com");
    let system = auth::get_system_user_id(&db).data.unwrap().id;

    let env = points::change_points(&db, &ChangePoints::earned(user, 100));
    assert_eq!(env.status, Status::Success);

    let history = points::get_points_history(&db, user).data.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|t| {
        (t.user_id_src == user && t.user_id_dest == system)
            || (t.user_id_src == system && t.user_id_dest == user)
    }));
    assert_eq!(history.iter().map(|t| t.change).sum::<i64>(), 0);
    assert!(history.iter().all(|t| t.kind == "earned" && t.memo == "system"));

    assert_eq!(points::get_total_points(&db, user).data.unwrap().total, 100);
}

#[test]
fn points_between_two_users() {
    let (db, buyer) = setup_user("buyer@b.com");
    auth::register(
        &db,
        &RegisterRequest {
            email: "seller@b.com".into(),
            password: "pw".into(),
        },
    );
    let seller = db.get_user_by_email("seller@b.com").unwrap().unwrap().id;

    points::change_points(&db, &ChangePoints::earned(buyer, 50));
    let env = points::change_points(
        &db,
        &ChangePoints {
            user_id: buyer,
            change: -20,
            dest: Some(seller),
            kind: "trade".into(),
            memo: "bought a scope".into(),
        },
    );
    assert!(env.is_success());

    assert_eq!(points::get_total_points(&db, buyer).data.unwrap().total, 30);
    assert_eq!(points::get_total_points(&db, seller).data.unwrap().total, 20);
}

#[test]
fn non_positive_dest_means_system_account() {
    let (db, user) = setup_user("a@b.com");
    let system = auth::get_system_user_id(&db).data.unwrap().id;

    let mut req = ChangePoints::earned(user, 5);
    req.dest = Some(-1);
    assert!(points::change_points(&db, &req).is_success());

    assert_eq!(points::get_total_points(&db, system).data.unwrap().total, -5);
}

#[test]
fn unnegatable_points_change_is_rejected() {
    let (db, user) = setup_user("a@b.com");

    let env = points::change_points(&db, &ChangePoints::earned(user, i64::MIN));
    assert_eq!(env.status, Status::BadRequest);
    assert_eq!(env.message, "Points change out of range");
    assert!(points::get_points_history(&db, user).data.unwrap().is_empty());

    let env = points::change_points(&db, &ChangePoints::earned(user, 25));
    assert_eq!(env.status, Status::Success);
    assert_eq!(points::get_total_points(&db, user).data.unwrap().total, 25);
}

#[test]
fn transfer_to_missing_user_records_nothing() {
    let (db, user) = setup_user("a@b.com");

    let mut req = ChangePoints::earned(user, 10);
    req.dest = Some(424242);
    let env = points::change_points(&db, &req);

    assert_eq!(env.status, Status::BadRequest);
    assert!(env.message.starts_with("DB Error: "));
    assert!(points::get_points_history(&db, user).data.unwrap().is_empty());
}

#[test]
fn total_xp_reflects_every_add() {
    let (db, user) = setup_user("a@b.com");
    assert_eq!(xp::get_total_xp(&db, user).data.unwrap().total, 0);

    for amount in [10, 20, 5] {
        assert!(xp::add_xp(&db, &AddXp::system(user, amount)).is_success());
    }
    let env = xp::add_xp(
        &db,
        &AddXp {
            user_id: user,
            amount: 15,
            kind: "match".into(),
            note: "won against bots".into(),
        },
    );
    assert!(env.is_success());

    assert_eq!(xp::get_total_xp(&db, user).data.unwrap().total, 50);
}

#[test]
fn total_xp_for_unknown_user_is_zero() {
    let db = Database::open_in_memory().unwrap();
    let env = xp::get_total_xp(&db, 9999);
    assert_eq!(env.status, Status::Success);
    assert_eq!(env.data.unwrap().total, 0);
}

#[test]
fn stats_update_then_aggregate() {
    let (db, user) = setup_user("a@b.com");
    xp::add_xp(&db, &AddXp::system(user, 120));
    points::change_points(&db, &ChangePoints::earned(user, 30));

    let env = stats::update_user_stats(
        &db,
        &UserStatsUpdate {
            user_id: user,
            level: 2,
            xp: 120,
            points: 30,
            wins: 4,
            losses: 3,
        },
    );
    assert!(env.is_success());

    let summary = stats::get_aggregated_stats(&db, user).data.unwrap();
    assert_eq!(summary.user_id, user);
    assert_eq!(summary.level, 2);
    assert_eq!(summary.wins, 4);
    assert_eq!(summary.losses, 3);
    assert_eq!(summary.total_xp, 120);
    assert_eq!(summary.total_points, 30);
}

#[test]
fn stats_for_unknown_user_are_not_found() {
    let db = Database::open_in_memory().unwrap();

    let env = stats::get_aggregated_stats(&db, 9999);
    assert_eq!(env.status, Status::BadRequest);
    assert_eq!(env.message, "Not found: user");

    let env = stats::update_user_stats(
        &db,
        &UserStatsUpdate {
            user_id: 9999,
            level: 1,
            xp: 0,
            points: 0,
            wins: 0,
            losses: 0,
        },
    );
    assert_eq!(env.status, Status::BadRequest);
    assert_eq!(env.message, "Not found: user");
}
