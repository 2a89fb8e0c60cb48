//! Arm executable entry point.
//!
//! # Architecture
//!
//! Each run executes a single [`ArmCmd`]:
//!
//!     - Initialise the session and logging
//!     - Load parameters and the joint map
//!     - Open the hardware (or the simulated drivers for a dry run)
//!     - Execute the command and print its result as JSON on stdout
//!     - Release the hardware

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use nalgebra::Point3;
use serde_json::json;
use std::{io::BufRead, sync::Arc};
use structopt::{clap::AppSettings, StructOpt};

// Internal
use arm_lib::{
    actuators::{Actuators, JointMap, JointMapFile, NUM_BOARDS},
    arm_ctrl::{self, ArmController, IkSolver, JointAngles, ThreadSleeper},
    bus_servo::{BusServoCtrl, BusTransport, SimBus},
    params::ArmExecParams,
    servo_ctrl::{ServoDriver, SimServoBoard},
};
use comms_if::{eqpt::joint::ArmSide, tc::arm_ctrl::ArmCmd};
use util::{
    diag::Diagnostics,
    diag_info, diag_warn,
    logger::{logger_init, LevelFilter},
    session::Session,
};

// ---------------------------------------------------------------------------
// STRUCTS
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(
    name = "arm_exec",
    about = "Artisan arm control",
    global_settings = &[AppSettings::AllowNegativeNumbers]
)]
struct Opts {
    /// Use simulated servo boards and bus instead of the hardware
    #[structopt(long)]
    dry_run: bool,

    /// Log debug and trace output
    #[structopt(short, long)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: ArmCmd,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opts = Opts::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    let min_level = if opts.verbose {
        LevelFilter::Trace
    } else {
        LevelFilter::Info
    };
    let diag =
        logger_init(min_level, "arm_exec", &session).wrap_err("Failed to initialise logging")?;

    diag_info!(diag, "Artisan Arm Executable\n");
    diag_info!(diag, "Session directory: {:?}\n", session.session_root);
    diag_info!(diag, "Command: {:?}", opts.cmd);

    // ---- LOAD PARAMETERS ----

    let exec_params: ArmExecParams =
        util::params::load("arm_exec.toml").wrap_err("Could not load exec params")?;

    let arm_params: arm_ctrl::Params =
        util::params::load("arm_ctrl.toml").wrap_err("Could not load arm control params")?;

    let joint_map = match util::params::load_optional::<JointMapFile>("joint_map.toml")
        .wrap_err("Could not load the joint map")?
    {
        Some(file) => {
            diag_info!(diag, "Using joint map from joint_map.toml");
            JointMap::from_file(file).wrap_err("The joint map is invalid")?
        }
        None => JointMap::default(),
    };

    diag_info!(diag, "Exec parameters loaded");

    // ---- RUN ----

    let result = if opts.dry_run {
        diag_warn!(diag, "Dry run, no hardware will be moved");
        run_sim(opts.cmd, &exec_params, arm_params, joint_map, &diag)
    } else {
        run_hardware(opts.cmd, &exec_params, arm_params, joint_map, &diag)
    };

    diag_info!(diag, "Run complete in {:.3} s", session.elapsed_seconds());
    diag.flush();

    result
}

/// Run a command on the simulated drivers.
fn run_sim(
    cmd: ArmCmd,
    exec_params: &ArmExecParams,
    arm_params: arm_ctrl::Params,
    joint_map: JointMap,
    diag: &Diagnostics,
) -> Result<(), Report> {
    let boards = (1..=NUM_BOARDS)
        .map(|b| SimServoBoard::new(b, diag.scoped(&format!("board_{}", b))))
        .collect();

    let bus = BusServoCtrl::new(
        SimBus::new(diag.scoped("sim_bus")),
        SimBus::new(diag.scoped("sim_bus_stop")),
        exec_params.bus_response_wait(),
        diag.scoped("bus_servo"),
    );

    execute(cmd, boards, bus, arm_params, joint_map, diag)
}

/// Run a command on the robot's servo boards and servo bus.
#[cfg(target_arch = "arm")]
fn run_hardware(
    cmd: ArmCmd,
    exec_params: &ArmExecParams,
    arm_params: arm_ctrl::Params,
    joint_map: JointMap,
    diag: &Diagnostics,
) -> Result<(), Report> {
    use arm_lib::{bus_servo::transport::open_serial, servo_ctrl::pca9685::init_board};
    use pwm_pca9685::{Address, Pca9685};
    use rppal::i2c::I2c;

    let mut boards = Vec::with_capacity(exec_params.board_addresses.len());

    for (i, address) in exec_params.board_addresses.iter().enumerate() {
        let i2c = I2c::with_bus(exec_params.i2c_bus)
            .wrap_err_with(|| format!("Could not open I2C bus {}", exec_params.i2c_bus))?;

        let mut pwm = Pca9685::new(i2c, Address::from(*address))
            .map_err(|e| eyre!("Could not create board {}: {:?}", i + 1, e))?;
        init_board(&mut pwm).wrap_err_with(|| format!("Could not initialise board {}", i + 1))?;

        diag_info!(diag, "Servo board {} ready at 0x{:02X}", i + 1, address);
        boards.push(pwm);
    }

    let (link, stop_line) = open_serial(
        &exec_params.bus_port,
        exec_params.bus_baud_rate,
        exec_params.bus_timeout(),
    )
    .wrap_err_with(|| format!("Could not open the servo bus on {}", exec_params.bus_port))?;

    let bus = BusServoCtrl::new(
        link,
        stop_line,
        exec_params.bus_response_wait(),
        diag.scoped("bus_servo"),
    );

    execute(cmd, boards, bus, arm_params, joint_map, diag)
}

#[cfg(not(target_arch = "arm"))]
fn run_hardware(
    _cmd: ArmCmd,
    _exec_params: &ArmExecParams,
    _arm_params: arm_ctrl::Params,
    _joint_map: JointMap,
    _diag: &Diagnostics,
) -> Result<(), Report> {
    Err(eyre!(
        "The servo hardware is only available on the robot, use --dry-run on this machine"
    ))
}

/// Build the controller on top of the given hardware and execute one command.
fn execute<D, T>(
    cmd: ArmCmd,
    boards: Vec<D>,
    bus: BusServoCtrl<T>,
    arm_params: arm_ctrl::Params,
    joint_map: JointMap,
    diag: &Diagnostics,
) -> Result<(), Report>
where
    D: ServoDriver,
    T: BusTransport,
{
    let solver = IkSolver::new(arm_params.arm_config(), diag.scoped("ik"))
        .wrap_err("Invalid arm configuration")?;

    let actuators = Arc::new(
        Actuators::new(joint_map, boards, bus, diag.scoped("actuators"))
            .wrap_err("Could not set up the actuators")?,
    );

    let ctrl = ArmController::new(
        solver,
        actuators.clone(),
        arm_params.grasp,
        arm_params.neutral,
        ThreadSleeper,
        diag.scoped("arm_ctrl"),
    );

    let output = run_cmd(cmd, &ctrl);

    drop(ctrl);
    if let Ok(actuators) = Arc::try_unwrap(actuators) {
        actuators.shutdown();
    }

    println!("{}", serde_json::to_string_pretty(&output?)?);

    Ok(())
}

/// Execute one command, returning the result to print.
fn run_cmd<D, T>(cmd: ArmCmd, ctrl: &ArmController<D, T>) -> Result<serde_json::Value, Report>
where
    D: ServoDriver,
    T: BusTransport,
{
    let value = match cmd {
        ArmCmd::SolveIk {
            x_m,
            y_m,
            z_m,
            side,
            approach_deg,
        } => {
            let target = Point3::new(x_m, y_m, z_m);
            let angles = match approach_deg {
                Some(a) => ctrl.solver().solve_ik_with_orientation(&target, a, side),
                None => ctrl.solver().solve_ik(&target, side),
            }
            .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "side": side, "angles_deg": angles })
        }
        ArmCmd::ForwardKinematics {
            shoulder_pitch_deg,
            shoulder_roll_deg,
            shoulder_yaw_deg,
            elbow_deg,
            wrist_deg,
            side,
        } => {
            let angles = JointAngles {
                shoulder_pitch_deg,
                shoulder_roll_deg,
                shoulder_yaw_deg,
                elbow_deg,
                wrist_deg,
            };
            let point = ctrl.solver().forward_kinematics_for(&angles, side);

            json!({ "side": side, "x_m": point.x, "y_m": point.y, "z_m": point.z })
        }
        ArmCmd::MoveTo {
            x_m,
            y_m,
            z_m,
            side,
            time_ms,
        } => {
            let angles = ctrl
                .move_to_position(&Point3::new(x_m, y_m, z_m), side, time_ms)
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "side": side, "angles_deg": angles })
        }
        ArmCmd::ReachAndGrasp { x_m, y_m, z_m, side } => {
            let outcome = ctrl
                .reach_and_grasp(&Point3::new(x_m, y_m, z_m), side, &mut ask_operator)
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            serde_json::to_value(outcome)?
        }
        ArmCmd::Release { side } => {
            ctrl.release(side)
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "released": side })
        }
        ArmCmd::Neutral => {
            ctrl.move_to_neutral_pose()
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "neutral": true })
        }
        ArmCmd::Stop => {
            ctrl.actuators().emergency_stop();

            json!({ "stopped": ctrl.actuators().joint_map().bus_ids() })
        }
        ArmCmd::Telemetry { joint } => {
            let sample = ctrl
                .actuators()
                .read_joint_telemetry(joint)
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "joint": joint, "telemetry": sample })
        }
        ArmCmd::LegPositions => serde_json::to_value(ctrl.actuators().get_leg_positions())?,
        ArmCmd::SetPulse { joint, pulse_us } => {
            ctrl.actuators()
                .set_joint_pulse(joint, pulse_us)
                .map_err(|e| eyre!("{} ({:?})", e, e.kind()))?;

            json!({ "joint": joint, "pulse_us": pulse_us })
        }
    };

    Ok(value)
}

/// Grasp signal for a robot without tactile sensors, the operator is asked.
fn ask_operator(side: ArmSide) -> bool {
    eprint!("Is the object held in the {} hand? [y/N] ", side);

    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(_) => matches!(line.trim(), "y" | "Y" | "yes"),
        Err(_) => false,
    }
}
