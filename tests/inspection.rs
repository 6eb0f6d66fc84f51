mod common;

use std::time::Duration;

use common::{MockTransport, RecordingSurface};
use rata_map::api::{Api, LatLon, STATIONS_PATH, TRAIN_LOCATIONS_PATH};
use rata_map::app::App;
use rata_map::config::Config;
use rata_map::console::Command;
use rata_map::map::{MapPresenter, MarkerKind};
use rata_map::refresh::{RefreshController, TickOutcome};
use rata_map::state::ViewState;
use tokio::time::Instant;

const COMPOSITION_27: &str = "/compositions/2024-03-01/27";

#[tokio::test]
async fn one_station_one_marker() {
    let api = Api::new(MockTransport::helsinki());
    let mut presenter = MapPresenter::new(RecordingSurface::default());

    assert_eq!(presenter.render_station_markers(&api).await, 1);

    let stations = presenter.surface().of_kind(MarkerKind::Station);
    assert_eq!(stations.len(), 1);
    assert_eq!(stations[0].at, LatLon::new(60.17, 24.94));
    assert_eq!(stations[0].popup.value("Station Name"), Some("Helsinki"));
    assert_eq!(stations[0].popup.value("Station Code"), Some("HKI"));
}

#[tokio::test]
async fn station_failure_renders_nothing() {
    let mock = MockTransport::new();
    mock.fail(STATIONS_PATH, 502);
    let mut presenter = MapPresenter::new(RecordingSurface::default());

    assert_eq!(presenter.render_station_markers(&Api::new(mock)).await, 0);
    assert!(presenter.surface().markers.is_empty());
}

#[tokio::test]
async fn train_redraw_replaces_markers() {
    let mock = MockTransport::helsinki();
    let api = Api::new(mock.clone());
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    presenter.render_station_markers(&api).await;

    assert_eq!(presenter.render_train_markers(&api).await.unwrap(), 1);
    mock.respond(TRAIN_LOCATIONS_PATH, common::train_locations(&[(8, [23.76, 61.5]), (9, [25.0, 62.0])]));
    assert_eq!(presenter.render_train_markers(&api).await.unwrap(), 2);

    let trains = presenter.surface().of_kind(MarkerKind::Train);
    assert_eq!(trains.len(), 2);
    assert_eq!(trains[0].popup.value("Train Number"), Some("8"));
    assert_eq!(trains[0].popup.value("Speed"), Some("120 km/h"));
    assert_eq!(presenter.surface().of_kind(MarkerKind::Station).len(), 1);
    assert!(presenter.find_train(27).is_none());

    // the station list from startup doubles as the name lookup
    assert_eq!(mock.calls(STATIONS_PATH), 1);
}

#[tokio::test]
async fn lookup_failure_skips_redraw() {
    let mock = MockTransport::helsinki();
    mock.fail(STATIONS_PATH, 500);
    let api = Api::new(mock.clone());
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    let mut refresh = RefreshController::new(Duration::from_secs(5), presenter.view());

    assert_eq!(refresh.tick(&api, &mut presenter).await, TickOutcome::Failed);
    assert_eq!(mock.calls(TRAIN_LOCATIONS_PATH), 0);
    assert!(presenter.surface().markers.is_empty());
}

#[tokio::test]
async fn click_pauses_refresh_until_close() {
    let mock = MockTransport::helsinki();
    let api = Api::new(mock.clone());
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    let mut refresh = RefreshController::new(Duration::from_secs(5), presenter.view());

    presenter.render_station_markers(&api).await;
    assert_eq!(refresh.tick(&api, &mut presenter).await, TickOutcome::Refreshed(1));

    let marker = presenter.find_train(27).unwrap();
    let ticket = presenter.click(marker).unwrap();

    // inspecting before any composition has been fetched
    assert!(presenter.is_inspecting());
    assert!(!refresh.is_enabled());
    assert_eq!(ticket.train_number, 27);
    assert_eq!(
        presenter.state(),
        ViewState::Inspecting { marker, train_number: 27, generation: ticket.generation }
    );

    let before = mock.total_calls();
    assert_eq!(refresh.tick(&api, &mut presenter).await, TickOutcome::Paused);
    assert_eq!(mock.total_calls(), before);

    presenter.close();
    assert_eq!(presenter.state(), ViewState::Idle);
    assert_eq!(refresh.tick(&api, &mut presenter).await, TickOutcome::Refreshed(1));
    assert_eq!(mock.total_calls(), before + 1);
    assert_eq!(mock.calls(TRAIN_LOCATIONS_PATH), 2);
}

#[tokio::test]
async fn composition_replaces_popup() {
    let mock = MockTransport::helsinki();
    mock.respond(COMPOSITION_27, common::composition(27));
    let api = Api::new(mock);
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    presenter.render_station_markers(&api).await;
    presenter.render_train_markers(&api).await.unwrap();

    let marker = presenter.find_train(27).unwrap();
    let ticket = presenter.click(marker).unwrap();
    let lookup = presenter.station_lookup().unwrap();
    let result = api.fetch_composition(ticket.train_number, ticket.departure_date, &lookup).await;

    assert!(presenter.apply_composition(ticket, result));

    let popup = &presenter.surface().marker(marker).unwrap().popup;
    assert_eq!(popup.value("Type"), Some("IC"));
    assert_eq!(popup.value("Start Station"), Some("Helsinki (2024-03-01 05:00 UTC)"));
    assert_eq!(popup.value("Wagons"), Some("1"));
    assert_eq!(presenter.surface().opened.last(), Some(&marker));
    assert!(presenter.is_inspecting());
}

#[tokio::test]
async fn missing_composition_keeps_popup_and_inspection() {
    let mock = MockTransport::helsinki();
    mock.fail(COMPOSITION_27, 500);
    let api = Api::new(mock);
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    presenter.render_station_markers(&api).await;
    presenter.render_train_markers(&api).await.unwrap();

    let marker = presenter.find_train(27).unwrap();
    let original = presenter.surface().marker(marker).unwrap().popup.clone();
    let ticket = presenter.click(marker).unwrap();
    let lookup = presenter.station_lookup().unwrap();
    let result = api.fetch_composition(27, ticket.departure_date, &lookup).await;

    assert!(!presenter.apply_composition(ticket, result));
    assert_eq!(presenter.surface().marker(marker).unwrap().popup, original);
    assert!(presenter.is_inspecting());
}

#[tokio::test]
async fn stale_composition_is_discarded() {
    let mock = MockTransport::helsinki();
    mock.respond(TRAIN_LOCATIONS_PATH, common::train_locations(&[(27, [24.94, 60.17]), (8, [23.76, 61.5])]));
    mock.respond(COMPOSITION_27, common::composition(27));
    let api = Api::new(mock);
    let mut presenter = MapPresenter::new(RecordingSurface::default());
    presenter.render_station_markers(&api).await;
    presenter.render_train_markers(&api).await.unwrap();

    let first = presenter.find_train(27).unwrap();
    let stale = presenter.click(first).unwrap();
    let lookup = presenter.station_lookup().unwrap();
    let result = api.fetch_composition(27, stale.departure_date, &lookup).await;

    // closed before the response arrived
    presenter.close();
    let original = presenter.surface().marker(first).unwrap().popup.clone();
    assert!(!presenter.apply_composition(stale, result));
    assert_eq!(presenter.surface().marker(first).unwrap().popup, original);

    // re-targeted to another train before the response arrived
    let stale = presenter.click(first).unwrap();
    let result = api.fetch_composition(27, stale.departure_date, &lookup).await;
    presenter.click(presenter.find_train(8).unwrap()).unwrap();
    assert!(!presenter.apply_composition(stale, result));
    assert_eq!(presenter.surface().marker(first).unwrap().popup, original);
}

#[tokio::test]
async fn app_handles_commands() {
    let mock = MockTransport::helsinki();
    mock.respond(COMPOSITION_27, common::composition(27));
    let mut app = App::new(Api::new(mock.clone()), MapPresenter::new(RecordingSurface::default()), &Config::default());

    app.start().await;
    assert_eq!(app.presenter().surface().markers.len(), 2);

    app.handle(Command::Click(27));
    assert!(app.presenter().is_inspecting());
    assert_eq!(app.refresh().await, TickOutcome::Paused);

    assert!(app.apply_next_composition().await);
    assert_eq!(mock.calls(COMPOSITION_27), 1);
    let marker = app.presenter().find_train(27).unwrap();
    let popup = &app.presenter().surface().marker(marker).unwrap().popup;
    assert_eq!(popup.value("Maximum Speed"), Some("200 km/h"));

    app.handle(Command::Close);
    assert_eq!(app.refresh().await, TickOutcome::Refreshed(1));

    // unknown train: nothing happens
    app.handle(Command::Click(1));
    assert!(!app.presenter().is_inspecting());
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_loop_between_refreshes() {
    let mock = MockTransport::helsinki();
    let mut app = App::new(Api::new(mock.clone()), MapPresenter::new(RecordingSurface::default()), &Config::default());
    app.start().await;
    let started = Instant::now();

    // refresh due at 5s must not push the 7s shutdown back
    let shutdown = tokio::time::sleep(Duration::from_secs(7));
    app.run_until(&b""[..], shutdown).await.unwrap();

    assert_eq!(started.elapsed(), Duration::from_secs(7));
    assert_eq!(mock.calls(TRAIN_LOCATIONS_PATH), 2);
}

#[tokio::test(start_paused = true)]
async fn quit_command_stops_loop() {
    let mock = MockTransport::helsinki();
    let mut app = App::new(Api::new(mock.clone()), MapPresenter::new(RecordingSurface::default()), &Config::default());
    app.start().await;
    let started = Instant::now();

    app.run_until(&b"click 27\n\nquit\n"[..], std::future::pending()).await.unwrap();

    assert_eq!(started.elapsed(), Duration::ZERO);
    assert!(app.presenter().is_inspecting());
    assert_eq!(mock.calls(TRAIN_LOCATIONS_PATH), 1);
}
