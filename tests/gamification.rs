use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn shelf_cmd() -> Command {
    let mut cmd = Command::cargo_bin("shelf").expect("binary shelf is built");
    cmd.env_remove("SHELF_DB_PATH");
    cmd.env_remove("SHELF_NOW");
    cmd.env_remove("SHELF_LOG");
    cmd
}

fn read_json(stdout: &[u8]) -> Value {
    serde_json::from_slice(stdout).expect("valid json")
}

fn add_book(db: &str, title: &str, pages: &str, genre: Option<&str>, ts: &str) {
    let mut args = vec![
        "--db", db, "add", title, "--author", "A. Writer", "--pages", pages, "--ts", ts,
    ];
    if let Some(g) = genre {
        args.push("--genre");
        args.push(g);
    }
    shelf_cmd().args(&args).assert().success();
}

fn effect_kinds(v: &Value) -> Vec<(String, Value)> {
    v["effects"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["kind"].as_str().unwrap().to_string(), e.clone()))
        .collect()
}

#[test]
fn finishing_a_book_awards_xp_level_and_achievement() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "The Dispossessed", "300", Some("Sci-Fi"), "2024-01-01T09:00:00Z");

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "progress",
            "b0001",
            "--page",
            "300",
            "--ts",
            "2024-01-02T10:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["xp"], 400);
    assert_eq!(v["level"], 3);
    assert_eq!(v["book"]["status"], "finished");
    assert_eq!(v["book"]["current_page"], 300);
    assert_eq!(v["book"]["finished_at"], "2024-01-02T10:00:00Z");

    let effects = effect_kinds(&v);
    assert!(effects
        .iter()
        .any(|(k, e)| k == "level_up" && e["new_level"] == 3));
    assert!(effects
        .iter()
        .any(|(k, e)| k == "achievement_unlocked" && e["id"] == "read_1"));

    // The unlock is recorded in the catalog view.
    let out = shelf_cmd()
        .args(["--db", db, "--format", "json", "achievements"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    let read_1 = v["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "read_1")
        .unwrap();
    assert_eq!(read_1["unlocked"], true);
    assert_eq!(read_1["unlocked_at"], "2024-01-02T10:00:00Z");
}

#[test]
fn finish_bonus_is_not_re_awarded() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "Annihilation", "195", None, "2024-01-01T09:00:00Z");

    shelf_cmd()
        .args([
            "--db", db, "progress", "b0001", "--page", "195", "--ts", "2024-01-02T10:00:00Z",
        ])
        .assert()
        .success();

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "progress",
            "b0001",
            "--page",
            "195",
            "--ts",
            "2024-01-03T10:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["xp"], 295);
    assert!(v["effects"].as_array().unwrap().is_empty());
    assert_eq!(v["book"]["finished_at"], "2024-01-02T10:00:00Z");
}

#[test]
fn pages_are_clamped_not_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "Dubliners", "152", None, "2024-01-01T09:00:00Z");

    // Negative request clamps to zero, earns nothing.
    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "progress",
            "b0001",
            "--page=-40",
            "--ts",
            "2024-01-02T10:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["book"]["current_page"], 0);
    assert_eq!(v["xp"], 0);

    // Overflowing request clamps to total_pages and finishes.
    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "progress",
            "b0001",
            "--page",
            "99999",
            "--ts",
            "2024-01-02T11:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["book"]["current_page"], 152);
    assert_eq!(v["book"]["status"], "finished");
    assert_eq!(v["xp"], 252);
}

#[test]
fn streak_extends_daily_and_survives_in_profile() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "Middlemarch", "880", None, "2024-01-01T09:00:00Z");

    for (page, ts) in [
        ("20", "2024-01-01T21:00:00Z"),
        ("40", "2024-01-02T21:00:00Z"),
        ("60", "2024-01-03T21:00:00Z"),
    ] {
        shelf_cmd()
            .args(["--db", db, "progress", "b0001", "--page", page, "--ts", ts])
            .assert()
            .success();
    }

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "profile",
            "--ts",
            "2024-01-03T22:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["current_streak"], 3);
    assert_eq!(v["longest_streak"], 3);
    assert_eq!(v["last_read_date"], "2024-01-03");

    // A same-day second session does not double-count.
    shelf_cmd()
        .args([
            "--db", db, "progress", "b0001", "--page", "80", "--ts", "2024-01-03T23:00:00Z",
        ])
        .assert()
        .success();

    // A gap restarts the streak but keeps the longest.
    shelf_cmd()
        .args([
            "--db", db, "progress", "b0001", "--page", "100", "--ts", "2024-01-09T21:00:00Z",
        ])
        .assert()
        .success();

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "profile",
            "--ts",
            "2024-01-09T22:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["current_streak"], 1);
    assert_eq!(v["longest_streak"], 3);
}

#[test]
fn challenge_accumulates_pages_and_overshoots() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "The Dispossessed", "300", None, "2024-01-01T09:00:00Z");

    shelf_cmd()
        .args([
            "--db", db, "progress", "b0001", "--page", "300", "--ts", "2024-01-02T10:00:00Z",
        ])
        .assert()
        .success();

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "profile",
            "--ts",
            "2024-01-02T11:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["challenge"]["current"], 300);
    assert_eq!(v["challenge"]["target"], 150);
    assert_eq!(v["challenge"]["percent"], 200);
    assert_eq!(v["challenge"]["complete"], true);
    assert_eq!(v["challenge"]["expired"], false);

    // Past the seeded 7-day window the profile reports expiry.
    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "profile",
            "--ts",
            "2024-02-01T00:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["challenge"]["expired"], true);
    assert_eq!(v["challenge"]["current"], 300);
}

#[test]
fn review_finishes_book_and_rejects_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    add_book(db, "Annihilation", "195", Some("Sci-Fi"), "2024-01-01T09:00:00Z");

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "review",
            "b0001",
            "--rating",
            "5",
            "--text",
            "Uncanny and beautiful, the tower breathes.",
            "--ts",
            "2024-01-05T10:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["xp"], 100);
    assert_eq!(v["level"], 2);
    assert_eq!(v["book"]["status"], "finished");
    assert_eq!(v["book"]["current_page"], 195);
    assert_eq!(v["book"]["rating"], 5);

    let effects = effect_kinds(&v);
    assert!(effects
        .iter()
        .any(|(k, e)| k == "achievement_unlocked" && e["id"] == "read_1"));
    assert!(effects
        .iter()
        .any(|(k, e)| k == "achievement_unlocked" && e["id"] == "social_review_1"));

    // Second substantive review is rejected and changes nothing.
    shelf_cmd()
        .args([
            "--db",
            db,
            "review",
            "b0001",
            "--rating",
            "2",
            "--text",
            "Actually I changed my mind entirely.",
            "--ts",
            "2024-01-06T10:00:00Z",
        ])
        .assert()
        .failure()
        .code(6)
        .stderr(predicate::str::contains("Duplicate review"));

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "profile",
            "--ts",
            "2024-01-06T11:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(read_json(&out)["xp"], 100);

    let out = shelf_cmd()
        .args(["--db", db, "--format", "json", "show", "b0001"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(read_json(&out)["book"]["rating"], 5);
}

#[test]
fn cork_uploads_and_favorites_drive_achievements() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    let out = shelf_cmd()
        .args([
            "--db",
            db,
            "--format",
            "json",
            "cork",
            "upload",
            "--image",
            "https://example.com/fanart.png",
            "--book-title",
            "The Dispossessed",
            "--tags",
            "fanart, ink",
            "--ts",
            "2024-01-02T10:00:00Z",
        ])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["item"]["id"], "k0001");
    assert_eq!(v["item"]["uploaded_by"], "reader");
    assert_eq!(v["item"]["tags"], serde_json::json!(["fanart", "ink"]));
    assert_eq!(v["xp"], 20);

    let effects = effect_kinds(&v);
    assert!(effects
        .iter()
        .any(|(k, e)| k == "achievement_unlocked" && e["id"] == "cork_upload_1"));

    // Toggling five favorites unlocks the collector badge on the fifth.
    for i in 1..=4 {
        shelf_cmd()
            .args(["--db", db, "cork", "favorite", &format!("ext{:04}", i)])
            .assert()
            .success();
    }

    let out = shelf_cmd()
        .args(["--db", db, "--format", "json", "cork", "favorite", "k0001"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["favorited"], true);
    let effects = effect_kinds(&v);
    assert!(effects
        .iter()
        .any(|(k, e)| k == "achievement_unlocked" && e["id"] == "cork_fav_5"));

    // Toggling off removes membership; the badge stays unlocked.
    let out = shelf_cmd()
        .args(["--db", db, "--format", "json", "cork", "favorite", "k0001"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    assert_eq!(v["favorited"], false);
    assert!(v["effects"].as_array().unwrap().is_empty());

    let out = shelf_cmd()
        .args(["--db", db, "--format", "json", "achievements"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let v = read_json(&out);
    let fav = v["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "cork_fav_5")
        .unwrap();
    assert_eq!(fav["unlocked"], true);
}

#[test]
fn diversity_badge_unlocks_on_third_genre() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("db.json");
    let db = db.to_str().unwrap();

    for (i, (title, genre)) in [
        ("Book One", "Fiction"),
        ("Book Two", "History"),
        ("Book Three", "Poetry"),
    ]
    .into_iter()
    .enumerate()
    {
        add_book(db, title, "100", Some(genre), "2024-01-01T09:00:00Z");
        let out = shelf_cmd()
            .args([
                "--db",
                db,
                "--format",
                "json",
                "progress",
                &format!("b{:04}", i + 1),
                "--page",
                "100",
                "--ts",
                "2024-01-02T10:00:00Z",
            ])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();

        let v = read_json(&out);
        let unlocked: Vec<&str> = v["effects"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|e| e["kind"] == "achievement_unlocked")
            .map(|e| e["id"].as_str().unwrap())
            .collect();

        if i < 2 {
            assert!(!unlocked.contains(&"div_genre_3"));
        } else {
            assert!(unlocked.contains(&"div_genre_3"));
        }
    }
}
