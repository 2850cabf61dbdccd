use smartfarm::{
    chat::{Role, WELCOME_MESSAGE},
    config::{FarmConfig, StartingState},
    crops::CropKind,
    farm::FarmError,
    game::{CellAction, Game, GameError},
    notifications::NotificationKind,
};

const HEAT_ALERT: &str = "🌡️ High temperature alert! Consider drought-resistant crops.";
const WATER_ALERT: &str = "💧 Water needs have increased for all crops.";

fn config(seed: u64) -> FarmConfig {
    FarmConfig {
        seed: Some(seed),
        ..FarmConfig::default()
    }
}

fn has_message(game: &Game, message: &str) -> bool {
    game.notifications().iter().any(|n| n.message == message)
}

fn count_message(game: &Game, message: &str) -> usize {
    game.notifications()
        .iter()
        .filter(|n| n.message == message)
        .count()
}

#[test]
fn new_game_starts_with_a_welcome() {
    let game = Game::new(&config(1));
    let snapshot = game.snapshot();
    assert_eq!(snapshot.day, 1);
    assert_eq!(snapshot.money, 1000);
    assert_eq!(snapshot.grid.len(), 6);
    assert_eq!(snapshot.analysis.available_plots, 36);
    assert_eq!(game.transcript().messages().len(), 1);
    assert_eq!(game.transcript().messages()[0].text, WELCOME_MESSAGE);
    assert!(game.notifications().is_empty());
    assert!(game.selected().is_none());
}

#[test]
fn clicking_without_a_selection_warns() {
    let mut game = Game::new(&config(1));
    let err = game.click_cell(0, 0).unwrap_err();
    assert_eq!(err, GameError::Farm(FarmError::InvalidSelection));
    assert_eq!(game.farm().money(), 1000);
    let notes = game.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].message, "🌱 Select a crop first!");
    assert_eq!(notes[0].kind, NotificationKind::Warning);
}

#[test]
fn selecting_an_unknown_crop_is_rejected() {
    let mut game = Game::new(&config(1));
    assert_eq!(
        game.select_crop(CropKind::new("PUMPKIN")),
        Err(GameError::Farm(FarmError::InvalidSelection))
    );
    assert!(game.selected().is_none());
}

#[test]
fn clicking_an_empty_cell_plants_the_selection() {
    let mut game = Game::new(&config(1));
    game.select_crop(CropKind::new("CORN")).unwrap();
    let action = game.click_cell(2, 3).unwrap();
    match action {
        CellAction::Planted(receipt) => {
            assert_eq!(receipt.kind.as_str(), "CORN");
            assert_eq!(receipt.cost, 25);
            assert!(receipt.replaced.is_none());
        }
        other => panic!("expected a planting, got {other:?}"),
    }
    assert_eq!(game.farm().money(), 975);
    assert!(has_message(&game, "🌱 Planted CORN!"));
    assert_eq!(game.analyze().planted_count, 1);
}

#[test]
fn planting_without_funds_notifies_the_cost() {
    let mut game = Game::new(&FarmConfig {
        start: StartingState {
            money: 20,
            ..StartingState::default()
        },
        ..config(1)
    });
    game.select_crop(CropKind::new("TOMATO")).unwrap();
    let err = game.click_cell(0, 0).unwrap_err();
    assert_eq!(
        err,
        GameError::Farm(FarmError::InsufficientFunds {
            cost: 35,
            available: 20
        })
    );
    assert_eq!(game.farm().money(), 20);
    assert!(game.farm().grid().get(0, 0).unwrap().is_none());
    let notes = game.notifications();
    assert_eq!(notes[0].message, "❌ Not enough money! Need $35");
    assert_eq!(notes[0].kind, NotificationKind::Error);
}

#[test]
fn clicking_outside_the_field_is_an_error() {
    let mut game = Game::new(&config(1));
    game.select_crop(CropKind::new("WHEAT")).unwrap();
    assert_eq!(
        game.click_cell(6, 0),
        Err(GameError::Farm(FarmError::InvalidCell { row: 6, col: 0 }))
    );
    assert_eq!(game.farm().money(), 1000);
}

#[test]
fn clicking_a_ready_crop_harvests_it() {
    let mut game = Game::new(&config(9));
    game.select_crop(CropKind::new("WHEAT")).unwrap();
    game.click_cell(0, 0).unwrap();

    game.next_day().unwrap();
    // Still growing: a second click replants.
    assert!(!game.farm().grid().get(0, 0).unwrap().unwrap().ready);
    let summary = game.next_day().unwrap();
    assert_eq!(summary.newly_ready, vec![CropKind::new("WHEAT")]);
    assert!(has_message(&game, "🌟 WHEAT is ready to harvest!"));
    assert!(has_message(&game, "✨ You have 1 crops ready to harvest!"));

    let money_before = game.farm().money();
    let yield_value = game.farm().grid().get(0, 0).unwrap().unwrap().yield_value;
    let action = game.click_cell(0, 0).unwrap();
    let CellAction::Harvested(receipt) = action else {
        panic!("expected a harvest");
    };
    assert_eq!(receipt.payout, (75.0 * yield_value).round() as u64);
    assert_eq!(game.farm().money(), money_before + receipt.payout);
    assert!(game.farm().grid().get(0, 0).unwrap().is_none());
    assert!(has_message(
        &game,
        &format!("💰 Harvested WHEAT for ${}!", receipt.payout)
    ));
}

#[test]
fn planting_over_a_growing_crop_replaces_it() {
    let mut game = Game::new(&config(1));
    game.select_crop(CropKind::new("CORN")).unwrap();
    game.click_cell(0, 0).unwrap();
    game.select_crop(CropKind::new("WHEAT")).unwrap();
    let CellAction::Planted(receipt) = game.click_cell(0, 0).unwrap() else {
        panic!("expected a planting");
    };
    assert_eq!(receipt.replaced.map(|cell| cell.kind), Some(CropKind::new("CORN")));
    assert_eq!(game.farm().money(), 1000 - 25 - 15);
    assert_eq!(game.analyze().planted_count, 1);
}

#[test]
fn heat_alerts_follow_the_temperature() {
    let mut game = Game::new(&FarmConfig {
        notification_ttl_secs: 600,
        ..config(7)
    });
    game.select_crop(CropKind::new("TOMATO")).unwrap();
    for _ in 0..60 {
        if game.farm().grid().get(0, 0).unwrap().is_none() {
            game.click_cell(0, 0).unwrap();
        } else if game.farm().grid().get(0, 0).unwrap().unwrap().ready {
            game.click_cell(0, 0).unwrap();
            game.click_cell(0, 0).unwrap();
        }
        let heat_before = count_message(&game, HEAT_ALERT);
        let water_before = count_message(&game, WATER_ALERT);
        let summary = game.next_day().unwrap();
        let hot = summary.temperature > 90;
        let growing = game
            .farm()
            .grid()
            .occupied()
            .any(|(_, _, cell)| !cell.ready);
        assert_eq!(
            count_message(&game, HEAT_ALERT) - heat_before,
            usize::from(hot)
        );
        assert_eq!(
            count_message(&game, WATER_ALERT) - water_before,
            usize::from(hot && growing)
        );
    }
}

#[test]
fn loans_accrue_interest_and_can_be_repaid() {
    let mut game = Game::new(&config(1));
    assert_eq!(game.take_loan(0), Ok(0));
    assert!(game.notifications().is_empty());

    assert_eq!(game.take_loan(500), Ok(500));
    assert_eq!(game.farm().money(), 1500);
    assert_eq!(game.farm().loans(), 500);

    let summary = game.next_day().unwrap();
    assert_eq!(summary.interest_charged, 5);
    assert_eq!(game.farm().loans(), 505);
    assert!(has_message(&game, "💸 Loan interest: $5"));

    assert_eq!(game.repay_loan(10_000), 505);
    assert_eq!(game.farm().loans(), 0);
    assert_eq!(game.farm().money(), 995);
    assert_eq!(game.repay_loan(10), 0);
}

#[test]
fn oversized_loans_are_refused_whole() {
    let mut game = Game::new(&config(1));
    assert_eq!(
        game.take_loan(u64::MAX),
        Err(GameError::Farm(FarmError::LoanTooLarge { amount: u64::MAX }))
    );
    assert_eq!(game.farm().loans(), 0);
    assert_eq!(game.farm().money(), 1000);
    assert!(game.notifications().is_empty());

    // The farm keeps running afterwards.
    let summary = game.next_day().unwrap();
    assert_eq!(summary.day, 2);
    assert_eq!(summary.interest_charged, 0);
}

#[test]
fn one_question_at_a_time() {
    let mut game = Game::new(&config(1));
    assert_eq!(game.begin_advice("   "), Err(GameError::EmptyQuestion));
    assert!(!game.advice_pending());

    let snapshot = game.begin_advice("  What should I plant?  ").unwrap();
    assert_eq!(snapshot.day, 1);
    assert!(game.advice_pending());
    assert_eq!(
        game.transcript().last().map(|m| (m.role, m.text.as_str())),
        Some((Role::User, "What should I plant?"))
    );
    assert_eq!(
        game.begin_advice("And now?"),
        Err(GameError::AdviceInFlight)
    );

    game.finish_advice("Plant wheat while it is cool.");
    assert!(!game.advice_pending());
    let messages = game.transcript().messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[2].role, Role::Assistant);
    assert_eq!(messages[2].text, "Plant wheat while it is cool.");

    assert!(game.begin_advice("And now?").is_ok());
}

#[test]
fn envelope_reflects_the_game() {
    let mut game = Game::new(&config(1));
    game.select_crop(CropKind::new("CORN")).unwrap();
    game.click_cell(0, 0).unwrap();
    let envelope = game.envelope();
    assert_eq!(envelope.name, "Smart Farm");
    assert_eq!(envelope.selected, Some(CropKind::new("CORN")));
    assert_eq!(envelope.catalog.len(), 3);
    assert_eq!(envelope.snapshot.money, 975);
    assert_eq!(envelope.notifications.len(), 1);

    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["snapshot"]["grid"][0][0]["kind"], "CORN");
    assert_eq!(json["snapshot"]["weather"], "sunny");
    assert_eq!(json["transcript"][0]["role"], "assistant");
    assert_eq!(json["notifications"][0]["kind"], "success");
}
