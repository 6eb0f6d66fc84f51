//! Live map event loop.

use std::future::Future;

use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::api::{Api, HttpTransport, TrainComposition, Transport};
use crate::config::Config;
use crate::console::{Command, HELP};
use crate::error;
use crate::map::{GeoJsonSurface, MapPresenter, MapSurface};
use crate::refresh::{RefreshController, TickOutcome};
use crate::state::InspectionTicket;

type CompositionDone = (InspectionTicket, error::Result<Option<TrainComposition>>);

pub async fn run(config: Config) -> Result<()> {
    let api = Api::new(HttpTransport::from_config(&config)?);
    let surface = GeoJsonSurface::new(&config.output, config.view.clone());
    log::info!("Writing markers to {}", surface.path().display());

    let mut app = App::new(api, MapPresenter::new(surface), &config);
    log::info!("Refreshing trains every {}s", app.refresh.period().as_secs());
    app.start().await;
    println!("{HELP}");

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Unable to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
        log::info!("Interrupted, shutting down");
    };

    app.run_until(BufReader::new(tokio::io::stdin()), interrupted).await
}

/// Live map state: API, presenter, refresh schedule and the channel that
/// brings composition results back onto the event loop.
pub struct App<T, S> {
    api: Api<T>,
    presenter: MapPresenter<S>,
    refresh: RefreshController,
    completions_tx: mpsc::UnboundedSender<CompositionDone>,
    completions: mpsc::UnboundedReceiver<CompositionDone>,
}

impl<T: Transport, S: MapSurface> App<T, S> {
    pub fn new(api: Api<T>, presenter: MapPresenter<S>, config: &Config) -> Self {
        let refresh = RefreshController::new(config.refresh_interval, presenter.view());
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self { api, presenter, refresh, completions_tx, completions }
    }

    pub fn presenter(&self) -> &MapPresenter<S> {
        &self.presenter
    }

    /// Draw stations and the first set of trains.
    pub async fn start(&mut self) {
        self.presenter.render_station_markers(&self.api).await;
        self.refresh().await;
    }

    pub async fn refresh(&mut self) -> TickOutcome {
        self.refresh.tick(&self.api, &mut self.presenter).await
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::Click(train_number) => {
                let Some(marker) = self.presenter.find_train(train_number) else {
                    println!("train {train_number} is not on the map");
                    return;
                };
                if let Some(ticket) = self.presenter.click(marker) {
                    self.spawn_composition(ticket);
                }
            }
            Command::Close => self.presenter.close(),
            Command::Trains => {
                for train in self.presenter.trains() {
                    println!(
                        "{:>6}  {}  {:>5} km/h  {}",
                        train.train_number, train.departure_date, train.speed, train.location
                    );
                }
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => {}
        }
    }

    /// Fetch the composition in the background; the result comes back
    /// through the completion channel tagged with `ticket`.
    fn spawn_composition(&self, ticket: InspectionTicket) {
        let api = self.api.clone();
        let lookup = self.presenter.station_lookup().unwrap_or_default();
        let tx = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = api.fetch_composition(ticket.train_number, ticket.departure_date, &lookup).await;
            // receiver only goes away on shutdown
            let _ = tx.send((ticket, result));
        });
    }

    /// Drive the map from `input` commands, refresh ticks and composition
    /// results until `quit` is read or `shutdown` completes.
    pub async fn run_until<R, F>(&mut self, input: R, shutdown: F) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        F: Future<Output = ()>,
    {
        let mut lines = input.lines();
        let mut input_open = true;
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                line = lines.next_line(), if input_open => match line? {
                    Some(line) if line.trim().is_empty() => {}
                    Some(line) => match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.handle(command),
                        Err(e) => println!("{e}"),
                    },
                    None => {
                        log::debug!("stdin closed, continuing without commands");
                        input_open = false;
                    }
                },
                () = self.refresh.next_due() => {
                    self.refresh().await;
                }
                Some((ticket, result)) = self.completions.recv() => {
                    self.presenter.apply_composition(ticket, result);
                }
            }
        }

        Ok(())
    }

    /// Wait for the next composition result and apply it.
    pub async fn apply_next_composition(&mut self) -> bool {
        match self.completions.recv().await {
            Some((ticket, result)) => self.presenter.apply_composition(ticket, result),
            None => false,
        }
    }
}
