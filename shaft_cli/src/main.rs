//! # Cyclo Shaft CLI
//!
//! Runs the input-shaft pipeline on a `.csd` project file or on one of the
//! built-in demo load cases and prints the results as text or JSON.
//!
//! ```text
//! shaft_cli --demo simple
//! shaft_cli --demo two-support --json
//! shaft_cli design.csd --samples 200
//! shaft_cli --demo simple --save demo.csd
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shaft_core::calculations::bearings::{BearingDimensions, BearingInput, BearingReport, PowerLossInput};
use shaft_core::calculations::shaft_analysis::{cyclo_disc_loads, AnalysisResult, ShaftLoadCase, ShaftMaterial};
use shaft_core::errors::{CalcError, CalcResult};
use shaft_core::file_io::{load_project_with_lock_check, save_project, FileLock};
use shaft_core::geometry::{BoundsReport, GeometryLimits, PlacementSnapshot, RegionKind};
use shaft_core::project::ShaftProject;
use shaft_core::session::DesignSession;
use shaft_core::units::Quantity;

#[derive(Parser)]
#[command(name = "shaft_cli")]
#[command(about = "Cycloidal drive input shaft designer", long_about = None)]
struct Cli {
    /// Path to a .csd project file
    project: Option<PathBuf>,

    /// Run a built-in load case instead of a project file
    #[arg(long, value_enum, conflicts_with = "project")]
    demo: Option<Demo>,

    /// Print the full report as JSON
    #[arg(long)]
    json: bool,

    /// Number of uniform samples along the shaft
    #[arg(long)]
    samples: Option<usize>,

    /// Save the (possibly demo) project to this path
    #[arg(long)]
    save: Option<PathBuf>,

    /// User recorded in the lock file while saving
    #[arg(long, default_value = "shaft_cli")]
    user: String,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Demo {
    /// Supports at both shaft ends, one pair of disc forces
    Simple,
    /// Two inner supports carrying two cyclo-discs
    TwoSupport,
}

/// Everything printed for one run.
#[derive(Serialize)]
struct Report<'a> {
    analysis: &'a AnalysisResult,
    limits: GeometryLimits,
    placements: PlacementSnapshot,
    bounds: BoundsReport,
    can_proceed: bool,
    bearings: Option<BearingReport>,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shaft_cli=info,shaft_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Ok(json) = serde_json::to_string_pretty(&e) {
                eprintln!();
                eprintln!("Error JSON:");
                eprintln!("{}", json);
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CalcResult<()> {
    let mut project = match (&cli.project, cli.demo) {
        (Some(path), _) => {
            let (project, holder) = load_project_with_lock_check(path)?;
            if let Some(info) = holder {
                eprintln!("Note: {} is open by {} on {} (read-only)", path.display(), info.user_id, info.machine);
            }
            project
        }
        (None, demo) => demo_project(demo.unwrap_or(Demo::Simple)),
    };

    if let Some(samples) = cli.samples {
        project.settings.analysis.sample_points = samples;
    }

    let mut session = project.open_session()?;
    if cli.project.is_none() {
        lay_out_demo_geometry(&mut session)?;
    }
    tracing::info!(
        label = %project.load_case.as_ref().map(|c| c.label.as_str()).unwrap_or(""),
        "Analysis complete"
    );

    let geometry = session
        .geometry()
        .ok_or_else(|| CalcError::invalid_input("geometry", "none", "Session has no geometry"))?;
    let analysis = session
        .analysis()
        .ok_or_else(|| CalcError::invalid_input("analysis", "none", "Session has no analysis"))?;
    let bearings = project.bearings.as_ref().map(|b| session.bearings(b)).transpose()?;

    let report = Report {
        analysis,
        limits: geometry.compute_limits(),
        placements: geometry.compute_placements(),
        bounds: geometry.validate_all_bounds(),
        can_proceed: session.can_proceed(),
        bearings,
    };

    if cli.json {
        let json =
            serde_json::to_string_pretty(&report).map_err(|e| CalcError::SerializationError { reason: e.to_string() })?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if let Some(path) = &cli.save {
        project.capture(&session);
        let _lock = FileLock::acquire(path, cli.user.as_str())?;
        save_project(&project, path)?;
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

fn demo_project(demo: Demo) -> ShaftProject {
    let material = ShaftMaterial::new("C45", 200.0, 2.0);
    let mut project = ShaftProject::new("demo", "DEMO");

    let case = match demo {
        Demo::Simple => ShaftLoadCase::simply_supported(500.0, 200.0, 20.0, 0.0, 10_000.0, 500.0, 2.0, material)
            .with_label("Simply supported demo"),
        Demo::TwoSupport => ShaftLoadCase::two_support(
            500.0,
            40.0,
            440.0,
            cyclo_disc_loads(&[200.0, 280.0], 5000.0),
            300.0,
            1.5,
            material,
        )
        .with_label("Two-support demo"),
    };
    project.set_load_case(case);

    let mut bearings = BearingInput::new(1500.0);
    bearings.support = Some(BearingDimensions {
        code: "6210".to_string(),
        bore_mm: 50.0,
        outer_mm: 90.0,
        raceway_mm: None,
        capacity_kn: 37.1,
        rolling_element_mm: Some(12.7),
    });
    bearings.central = Some(BearingDimensions {
        code: "NJ 2212".to_string(),
        bore_mm: 60.0,
        outer_mm: 110.0,
        raceway_mm: Some(97.0),
        capacity_kn: 122.0,
        rolling_element_mm: Some(14.0),
    });
    bearings.power_loss = Some(PowerLossInput {
        angular_velocity_rad_s: 1500.0 * std::f64::consts::PI / 30.0,
        rolling_friction_mm: 0.005,
        pitch_radius_mm: 40.0,
    });
    project.set_bearings(bearings);
    project
}

/// Fill every region with one subsection sized from the current limits.
fn lay_out_demo_geometry(session: &mut DesignSession) -> CalcResult<()> {
    let Some(model) = session.geometry_mut() else {
        return Ok(());
    };

    let limits = model.compute_limits();
    let eccentric_diameter = model.frame().eccentric_diameter_mm.ceil();
    for index in 0..model.subsection_count(RegionKind::Eccentrics) {
        let room = limits
            .subsection(RegionKind::Eccentrics, index)
            .map(|l| l.max_length_mm)
            .unwrap_or(0.0);
        model.set_subsection_attributes(RegionKind::Eccentrics, index, (room / 2.0).min(16.0), eccentric_diameter)?;
    }

    for region in [RegionKind::BeforeEccentrics, RegionKind::BetweenEccentrics, RegionKind::AfterEccentrics] {
        let limits = model.compute_limits();
        let Some(next) = limits.region(region).and_then(|r| r.next) else {
            continue;
        };
        if next.max_length_mm > 0.0 {
            model.append_subsection(region, next.max_length_mm, next.min_diameter_mm.ceil().max(1.0))?;
        }
    }
    Ok(())
}

fn print_report(report: &Report) {
    let analysis = report.analysis;
    println!("═══════════════════════════════════════");
    println!("  INPUT SHAFT: {}", analysis.label);
    println!("═══════════════════════════════════════");
    println!();
    println!("Reactions:");
    println!("  Ra = {:.2} {}", analysis.reaction_a_n, Quantity::Reaction.unit());
    println!("  Rb = {:.2} {}", analysis.reaction_b_n, Quantity::Reaction.unit());
    println!();
    println!("Diameters:");
    println!("  dsc = {:.2} mm  (max required shaft diameter)", analysis.shaft_diameter_mm);
    println!("  dec = {:.2} mm  (eccentric diameter)", analysis.eccentric_diameter_mm);
    println!("  kgo = {:.2} {}", analysis.permissible_stress_mpa, Quantity::Stress.unit());
    println!();

    let columns = [
        Quantity::AxialPosition,
        Quantity::BendingMoment,
        Quantity::Torque,
        Quantity::EquivalentMoment,
        Quantity::Diameter,
    ];
    let header: Vec<String> = columns.iter().map(|q| format!("{:>12}", q.header())).collect();
    println!("{}", header.join(""));
    for s in &analysis.samples {
        println!(
            "{:>12.2}{:>12.2}{:>12.2}{:>12.2}{:>12.2}",
            s.z_mm, s.bending_nm, s.torque_nm, s.equivalent_nm, s.diameter_mm
        );
    }
    println!();

    println!("Shaft layout:");
    for region in RegionKind::ALL {
        for p in report.placements.region(region) {
            println!(
                "  {:<18} #{:<2} z = {:>7.2} .. {:>7.2} mm  d = {:>6.2} mm",
                region.name(),
                p.index,
                p.start_mm,
                p.end_mm(),
                p.diameter_mm
            );
        }
    }
    for v in &report.bounds.violations {
        println!("  ! {} #{} out of bounds: {:?}", v.region, v.index, v.bound);
    }
    println!();

    if let Some(bearings) = &report.bearings {
        println!("Bearings:");
        println!(
            "  support C >= {:.2} {} (bore >= {:.2} mm)",
            bearings.support_required_kn,
            Quantity::LoadCapacity.unit(),
            bearings.support_catalog.min_bore_mm
        );
        println!(
            "  central C >= {:.2} {} (bore >= {:.2} mm)",
            bearings.central_required_kn,
            Quantity::LoadCapacity.unit(),
            bearings.central_catalog.min_bore_mm
        );
        if let Some(loss) = &bearings.power_loss {
            println!(
                "  power loss: A {:.2} / B {:.2} / eccentrics {:.2} {}",
                loss.support_a_w,
                loss.support_b_w,
                loss.eccentrics_w,
                Quantity::PowerLoss.unit()
            );
        }
        for warning in &bearings.warnings {
            println!("  ! {}", warning);
        }
        println!();
    }

    println!("═══════════════════════════════════════");
    println!("  RESULT: {}", if report.can_proceed { "READY" } else { "INCOMPLETE" });
    println!("═══════════════════════════════════════");
}
