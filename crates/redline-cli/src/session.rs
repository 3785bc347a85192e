//! Interactive session: stdin lines drive the controller the way a map UI
//! would.

use std::str::FromStr;
use std::sync::Arc;

use miette::{IntoDiagnostic, Result};
use redline_common::{ClientConfig, MapService, UserId};
use redline_core::adapter::{Camera, MapAdapter, MapStyle, ScreenPoint};
use redline_core::SyncController;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render;

const HELP: &str = "\
commands:
  init                    load the overlay and pins
  search <keyword>        filter the overlay by keyword
  click <x> <y>           click the map at a viewport pixel
  pin <lat> <lng>         add a pin at a coordinate
  clear                   remove all of your pins
  restart                 reload everything
  pins                    list pins
  camera <lng> <lat> <z>  move the camera
  user <id>               switch user
  show [json]             draw the current scene
  help                    this text
  quit";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Init,
    Search(String),
    Click(ScreenPoint),
    Pin { lat: String, lng: String },
    Clear,
    Restart,
    Pins,
    Camera(Camera),
    User(UserId),
    Show { json: bool },
    Help,
    Quit,
}

impl FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let args: Vec<&str> = rest.split_whitespace().collect();

        let number = |s: &str| {
            s.parse::<f64>()
                .map_err(|_| format!("'{s}' is not a number"))
        };

        match (word, args.as_slice()) {
            ("init", []) => Ok(SessionCommand::Init),
            // The keyword goes through as typed, empty included.
            ("search", _) => Ok(SessionCommand::Search(rest.to_string())),
            ("click", [x, y]) => Ok(SessionCommand::Click(ScreenPoint::new(
                number(*x)?,
                number(*y)?,
            ))),
            ("pin", [lat, lng]) => Ok(SessionCommand::Pin {
                lat: lat.to_string(),
                lng: lng.to_string(),
            }),
            ("clear", []) => Ok(SessionCommand::Clear),
            ("restart", []) => Ok(SessionCommand::Restart),
            ("pins", []) => Ok(SessionCommand::Pins),
            ("camera", [lng, lat, zoom]) => Ok(SessionCommand::Camera(Camera::new(
                number(*lng)?,
                number(*lat)?,
                number(*zoom)?,
            ))),
            ("user", [id]) => Ok(SessionCommand::User(UserId::new(*id))),
            ("show", []) => Ok(SessionCommand::Show { json: false }),
            ("show", ["json"]) => Ok(SessionCommand::Show { json: true }),
            ("help" | "?", _) => Ok(SessionCommand::Help),
            ("quit" | "exit", _) => Ok(SessionCommand::Quit),
            ("", _) => Err("empty command".to_string()),
            (word, _) => Err(format!("unknown or malformed command '{word}', try 'help'")),
        }
    }
}

pub async fn run<S: MapService>(
    controller: Arc<SyncController<S>>,
    config: &ClientConfig,
) -> Result<()> {
    // Terminal drawing never loads tiles, so a missing token only loses the
    // base map line. A tiled widget would propagate this error instead.
    let style = match MapStyle::from_config(config) {
        Ok(style) => style,
        Err(e) => {
            tracing::warn!(error = %e, "no tile token, drawing without a base map");
            MapStyle::untiled()
        }
    };
    let mut adapter = MapAdapter::new(controller.clone());

    println!("→ Loading overlay and pins for {}", controller.user_id());
    controller.initialize().await;
    println!("{}", render::status(&controller.snapshot()));
    println!("type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.into_diagnostic()? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<SessionCommand>() {
            Ok(command) => command,
            Err(message) => {
                println!("⚠ {message}");
                continue;
            }
        };

        match command {
            SessionCommand::Init => controller.initialize().await,
            SessionCommand::Search(keyword) => controller.search(&keyword).await,
            SessionCommand::Click(point) => {
                let coordinate = adapter.on_click(point).await;
                println!("→ Clicked {coordinate}");
            }
            SessionCommand::Pin { lat, lng } => controller.add_pin_raw(&lat, &lng).await,
            SessionCommand::Clear => controller.clear_all().await,
            SessionCommand::Restart => controller.restart().await,
            SessionCommand::Pins => {
                println!("{}", render::markers(&controller.snapshot().markers));
                continue;
            }
            SessionCommand::Camera(camera) => {
                adapter.set_camera(camera);
                println!(
                    "✓ Camera at {:.4}, {:.4} z{}",
                    camera.longitude, camera.latitude, camera.zoom
                );
                continue;
            }
            SessionCommand::User(user) => controller.set_user(user).await,
            SessionCommand::Show { json } => {
                let scene = adapter.current_scene();
                if json {
                    println!("{}", serde_json::to_string_pretty(&scene).into_diagnostic()?);
                } else {
                    println!("{}", render::scene(&scene, &style));
                }
                continue;
            }
            SessionCommand::Help => {
                println!("{HELP}");
                continue;
            }
            SessionCommand::Quit => break,
        }
        println!("{}", render::status(&controller.snapshot()));
    }

    Ok(())
}
