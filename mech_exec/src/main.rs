//! # Mechanisms Playback Executable
//!
//! Plays PLEN motion files on the robot's joints. With a motion file argument that motion is
//! played once, otherwise the motions in the parameter's motion directory are listed and can be
//! chosen interactively, optionally with a playback speed.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use structopt::StructOpt;

// Internal
use mech_lib::{
    joint_ctrl::{JointCtrl, JointRegistry},
    motion::{MotionError, MotionPlayer, PlaybackReport, StopHandle},
    params::MechExecParams,
    servo_ctrl::{open_port, ActuatorPort, Backend},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

const PROMPT: &str = "> ";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Play PLEN motion files.
#[derive(Debug, StructOpt)]
#[structopt(name = "mech_exec")]
struct Opt {
    /// Motion file to play. If not given the available motions are listed interactively.
    #[structopt(parse(from_os_str))]
    motion: Option<PathBuf>,

    /// Playback speed multiplier
    #[structopt(short, long)]
    speed: Option<f64>,

    /// Use the simulated actuator port regardless of the parameters
    #[structopt(long)]
    sim: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A line entered at the interactive prompt.
#[derive(Debug, PartialEq)]
enum Choice {
    Quit,
    Play { index: usize, speed: Option<f64> },
    Nothing,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    // Initialise session
    let session = Session::new(
        "mech_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("PLEN Mechanisms Playback Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    info!("Initialising...");

    // ---- LOAD PARAMETERS ----

    let mut params: MechExecParams = util::params::load("mech_exec.toml")
        .wrap_err("Failed to load parameters")?;
    if opt.sim {
        params.actuator.backend = Backend::Sim;
    }
    let root = host::get_plen_sw_root()
        .wrap_err("Failed to get the software root")?;

    info!("Parameters loaded");

    // ---- JOINT INITIALISATION ----

    let port = open_port(&params.actuator)
        .wrap_err("Failed to open the actuator port")?;

    let mut registry = JointRegistry::new();
    registry.load(params.resolve(&root, &params.calib_file));

    let mut ctrl = JointCtrl::new(registry, port);
    let failed = ctrl.home_all();
    if failed > 0 {
        warn!("{} joints could not be sent home", failed);
    }

    // Ctrl-C stops whichever playback is running
    let current: Arc<Mutex<Option<StopHandle>>> = Arc::new(Mutex::new(None));
    {
        let current = current.clone();
        ctrlc::set_handler(move || {
            if let Ok(c) = current.lock() {
                if let Some(handle) = c.as_ref() {
                    handle.stop();
                }
            }
        })
        .wrap_err("Failed to set the interrupt handler")?;
    }

    info!("Initialisation complete");

    let speed = opt.speed.unwrap_or(params.default_speed);

    // ---- SINGLE MOTION ----

    if let Some(path) = opt.motion {
        info!("Playing provided motion file: {:?}", path);
        play(&mut ctrl, &current, &path, speed)
            .wrap_err_with(|| format!("Failed to play {:?}", path))?;
        return Ok(());
    }

    // ---- INTERACTIVE ----

    let motion_dir = params.resolve(&root, &params.motion_dir);
    let motions = list_motions(&motion_dir)
        .wrap_err_with(|| format!("Failed to list motions in {:?}", motion_dir))?;

    if motions.is_empty() {
        warn!("No motion files found in {:?}", motion_dir);
        return Ok(());
    }

    println!("\nAvailable Motions:");
    for (i, m) in motions.iter().enumerate() {
        println!("{:3}: {}", i, m.file_name().and_then(|n| n.to_str()).unwrap_or("?"));
    }
    println!("\nEnter a number to play, optionally followed by a speed, or 'q' to quit.");

    let mut rl = DefaultEditor::new().wrap_err("Failed to start the prompt")?;

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Failed to read the prompt"),
        };
        let _ = rl.add_history_entry(line.as_str());

        match parse_choice(&line, motions.len()) {
            Ok(Choice::Quit) => break,
            Ok(Choice::Nothing) => (),
            Ok(Choice::Play { index, speed: s }) => {
                let path = &motions[index];
                if let Err(e) = play(&mut ctrl, &current, path, s.unwrap_or(speed)) {
                    error!("Could not play {:?}: {}", path, e);
                }
            }
            Err(msg) => println!("{}", msg),
        }
    }

    info!("Exiting");

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Play one motion file with a fresh player, publishing its stop handle for Ctrl-C.
fn play<P: ActuatorPort>(
    ctrl: &mut JointCtrl<P>,
    current: &Mutex<Option<StopHandle>>,
    path: &Path,
    speed: f64,
) -> Result<PlaybackReport, MotionError> {
    let mut player = MotionPlayer::new();

    if let Ok(mut c) = current.lock() {
        *c = Some(player.stop_handle());
    }

    let result = player.play_file(ctrl, path, speed);

    if let Ok(mut c) = current.lock() {
        *c = None;
    }

    let report = result?;
    info!(
        "{:?} after {} frames, {} steps",
        report.outcome, report.frames_played, report.steps
    );

    Ok(report)
}

/// List the `*.json` files in `dir`, sorted by path.
fn list_motions(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut motions = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
            motions.push(path);
        }
    }

    motions.sort();
    Ok(motions)
}

/// Parse a prompt line of the form `q`, `<index>` or `<index> <speed>`.
fn parse_choice(line: &str, num_motions: usize) -> Result<Choice, String> {
    let mut words = line.split_whitespace();

    let first = match words.next() {
        Some(w) => w,
        None => return Ok(Choice::Nothing),
    };

    if first.eq_ignore_ascii_case("q") {
        return Ok(Choice::Quit);
    }

    let index: usize = first
        .parse()
        .map_err(|_| String::from("Please enter a number or 'q'."))?;
    if index >= num_motions {
        return Err(String::from("Invalid selection."));
    }

    let speed = match words.next() {
        Some(w) => Some(
            w.parse::<f64>()
                .map_err(|_| format!("Invalid speed \"{}\".", w))?,
        ),
        None => None,
    };

    Ok(Choice::Play { index, speed })
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
