//! # Joint Calibration Executable
//!
//! Interactive tool for adjusting the home angle of each joint and saving the result to the
//! calibration file.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Result};
use log::{error, info, warn};
use rustyline::{error::ReadlineError, DefaultEditor};
use structopt::StructOpt;

// Internal
use mech_lib::{
    joint_ctrl::{CalibStep, Calibrator, JointCtrl, JointRegistry, Wiring},
    params::MechExecParams,
    servo_ctrl::{open_port, ActuatorPort, Backend},
};
use util::{
    host,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Calibrate the home angles of the PLEN joints.
#[derive(Debug, StructOpt)]
#[structopt(name = "calibrate")]
struct Opt {
    /// Use the simulated actuator port regardless of the parameters
    #[structopt(long)]
    sim: bool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands accepted when no joint is selected.
#[derive(Debug, PartialEq)]
enum MenuCmd {
    Select(usize),
    List,
    Save,
    Quit,
    Nothing,
}

/// Commands accepted while a joint is selected.
#[derive(Debug, PartialEq)]
enum JointCmd {
    Step(CalibStep),
    Goto(i32),
    Home(i32),
    Back,
    Nothing,
}

// ------------------------------------------------------------------------------------------------
// MAIN
// ------------------------------------------------------------------------------------------------

fn main() -> Result<()> {

    // ---- EARLY INITIALISATION ----

    color_eyre::install()?;

    let opt = Opt::from_args();

    let session = Session::new(
        "calibrate",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    info!("PLEN Joint Calibration Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let mut params: MechExecParams = util::params::load("mech_exec.toml")
        .wrap_err("Failed to load parameters")?;
    if opt.sim {
        params.actuator.backend = Backend::Sim;
    }
    let root = host::get_plen_sw_root()
        .wrap_err("Failed to get the software root")?;
    let calib_path = params.resolve(&root, &params.calib_file);

    // ---- JOINT INITIALISATION ----

    let port = open_port(&params.actuator)
        .wrap_err("Failed to open the actuator port")?;

    let mut registry = JointRegistry::new();
    registry.load(&calib_path);

    let mut ctrl = JointCtrl::new(registry, port);
    let failed = ctrl.home_all();
    if failed > 0 {
        warn!("{} joints could not be sent home", failed);
    }

    info!("Initialisation complete");

    // ---- MENU ----

    let mut rl = DefaultEditor::new().wrap_err("Failed to start the prompt")?;
    let mut cal = Calibrator::new();

    print_joints(&ctrl);
    print_menu_help();

    loop {
        let prompt = match cal.selected() {
            Some(id) => format!("[{} {}] > ", id, id.display_name().unwrap_or("")),
            None => String::from("> "),
        };

        let line = match rl.readline(&prompt) {
            Ok(l) => l,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e).wrap_err("Failed to read the prompt"),
        };
        let _ = rl.add_history_entry(line.as_str());

        if cal.selected().is_some() {
            match parse_joint_cmd(&line) {
                Ok(cmd) => run_joint_cmd(&mut ctrl, &mut cal, cmd),
                Err(msg) => println!("{}", msg),
            }
            continue;
        }

        match parse_menu_cmd(&line) {
            Ok(MenuCmd::Quit) => break,
            Ok(MenuCmd::Nothing) => (),
            Ok(MenuCmd::List) => print_joints(&ctrl),
            Ok(MenuCmd::Save) => {
                if ctrl.registry().save(&calib_path) {
                    println!("Saved to {:?}", calib_path);
                }
            }
            Ok(MenuCmd::Select(index)) => match cal.select(&mut ctrl, index) {
                Ok(id) => {
                    println!(
                        "Selected joint {}, home {}",
                        id,
                        ctrl.registry().home(id)
                    );
                    print_joint_help();
                }
                Err(e) => println!("{}", e),
            },
            Err(msg) => println!("{}", msg),
        }
    }

    info!("Exiting");

    Ok(())
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn run_joint_cmd<P: ActuatorPort>(ctrl: &mut JointCtrl<P>, cal: &mut Calibrator, cmd: JointCmd) {
    let result = match cmd {
        JointCmd::Nothing => Ok(()),
        JointCmd::Back => {
            cal.deselect();
            print_menu_help();
            Ok(())
        }
        JointCmd::Step(step) => cal.step(ctrl, step).map(|home| println!("home {}", home)),
        JointCmd::Goto(angle) => cal.preview(ctrl, angle),
        JointCmd::Home(home) => cal.set_home(ctrl, home).map(|_| println!("home {}", home)),
    };

    if let Err(e) = result {
        error!("{}", e);
    }
}

/// Print the named joints in two columns, left side then right side.
fn print_joints<P: ActuatorPort>(ctrl: &JointCtrl<P>) {
    let named: Vec<String> = ctrl
        .registry()
        .iter()
        .filter(|(_, spec)| spec.wiring != Wiring::Unwired)
        .filter_map(|(id, spec)| {
            id.display_name()
                .map(|name| format!("{:>2}: {:<20} {:>5}", id, name, spec.home))
        })
        .collect();

    let half = (named.len() + 1) / 2;
    let (left, right) = named.split_at(half);

    println!("\nJoints (id: name home):");
    for (i, l) in left.iter().enumerate() {
        match right.get(i) {
            Some(r) => println!("  {}    {}", l, r),
            None => println!("  {}", l),
        }
    }
    println!();
}

fn print_menu_help() {
    println!("Enter a joint id to select it, 'l' to list, 's' to save, 'q' to quit.");
}

fn print_joint_help() {
    println!(
        "'w'/'s' home +/-1, 'W'/'S' home +/-10, 'goto <angle>', 'home <value>', 'q' to go back."
    );
}

fn parse_menu_cmd(line: &str) -> Result<MenuCmd, String> {
    let word = match line.split_whitespace().next() {
        Some(w) => w,
        None => return Ok(MenuCmd::Nothing),
    };

    match word {
        "q" | "Q" => Ok(MenuCmd::Quit),
        "l" | "L" => Ok(MenuCmd::List),
        "s" | "S" => Ok(MenuCmd::Save),
        w => w
            .parse::<usize>()
            .map(MenuCmd::Select)
            .map_err(|_| format!("Unknown command \"{}\".", w)),
    }
}

fn parse_joint_cmd(line: &str) -> Result<JointCmd, String> {
    let mut words = line.split_whitespace();

    let word = match words.next() {
        Some(w) => w,
        None => return Ok(JointCmd::Nothing),
    };

    let mut value = || -> Result<i32, String> {
        let w = words
            .next()
            .ok_or_else(|| format!("\"{}\" needs a value.", word))?;
        w.parse::<i32>()
            .map_err(|_| format!("Invalid value \"{}\".", w))
    };

    match word {
        "w" => Ok(JointCmd::Step(CalibStep::Up)),
        "s" => Ok(JointCmd::Step(CalibStep::Down)),
        "W" => Ok(JointCmd::Step(CalibStep::UpLarge)),
        "S" => Ok(JointCmd::Step(CalibStep::DownLarge)),
        "goto" => Ok(JointCmd::Goto(value()?)),
        "home" => Ok(JointCmd::Home(value()?)),
        "q" | "Q" => Ok(JointCmd::Back),
        w => Err(format!("Unknown command \"{}\".", w)),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
