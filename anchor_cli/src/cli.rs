use std::path::{Path, PathBuf};

use anchor_core::calculations::micropile::{
    check_micropile, minimum_bond_length, BondLengthInput, MicropileInput, MicropileResult,
};
use anchor_core::calculations::{evaluate_anchorage, AnchorageReport, BulbLoadResult};
use anchor_core::file_io::{load_dataset, save_dataset, save_json, FileLock};
use anchor_core::materials::{builtin_micropile_sections, AreaUnit, RebarExpression};
use anchor_core::project::{Anchor, Dataset, ProjectGlobals};
use anyhow::{bail, Context};
use clap::ArgAction;
use serde::Serialize;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);

        self.command.run(self.json)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Evaluate every anchor of an interchange file and the bulb load
    Evaluate(Evaluate),

    /// Write a new interchange file with default project values
    Init(Init),

    /// Append an anchor to an interchange file
    Add(Add),

    /// Remove an anchor (1-based number) from an interchange file
    Remove(Remove),

    /// Evaluate a reinforcement area expression, e.g. "f12/0.20+f16/0.20"
    Rebar(Rebar),

    /// Check a CHS micropile for buckling
    Micropile(Micropile),

    /// Minimum bond length for a service load
    BondLength(BondLength),

    /// List the built-in CHS micropile sections
    Sections,
}

impl Command {
    fn run(self, json: bool) -> anyhow::Result<()> {
        match self {
            Self::Evaluate(command) => command.run(json)?,
            Self::Init(command) => command.run()?,
            Self::Add(command) => command.run()?,
            Self::Remove(command) => command.run()?,
            Self::Rebar(command) => command.run(json)?,
            Self::Micropile(command) => command.run(json)?,
            Self::BondLength(command) => command.run(json)?,
            Self::Sections => list_sections(json)?,
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status_icon(pass: bool) -> &'static str {
    if pass { "[OK]" } else { "[FAIL]" }
}

fn user_id() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "anchor_cli".to_string())
}

fn load(path: &Path) -> anyhow::Result<Dataset> {
    let outcome = load_dataset(path).with_context(|| format!("failed to load {}", path.display()))?;
    for skipped in &outcome.skipped {
        eprintln!("warning: {}", skipped);
    }
    for error in &outcome.column_errors {
        eprintln!("warning: {}", error);
    }
    if let Some(error) = &outcome.payload_error {
        eprintln!("warning: {}", error);
    }
    Ok(outcome.dataset)
}

/// Load, edit and save a file while holding its lock
fn edit(path: &Path, change: impl FnOnce(&mut Dataset) -> anyhow::Result<()>) -> anyhow::Result<()> {
    let _lock = FileLock::acquire(path, user_id()).with_context(|| format!("cannot lock {}", path.display()))?;
    let mut dataset = load(path)?;
    change(&mut dataset)?;
    save_dataset(&dataset, path).with_context(|| format!("failed to save {}", path.display()))?;
    Ok(())
}

// =============================================================================
// EVALUATE
// =============================================================================

#[derive(Debug, clap::Args)]
pub struct Evaluate {
    /// Interchange CSV file
    file: PathBuf,

    /// Also write the report as JSON to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Evaluate {
    fn run(self, json: bool) -> anyhow::Result<()> {
        let dataset = load(&self.file)?;
        let report = evaluate_anchorage(&dataset.anchors, &dataset.globals);

        if let Some(output) = &self.output {
            save_json(&report, output).with_context(|| format!("failed to write {}", output.display()))?;
        }

        if json {
            return print_json(&report);
        }
        print_report(&report);
        Ok(())
    }
}

fn print_report(report: &AnchorageReport) {
    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!("  {}", report.section_name);
    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!();
    println!(
        "{:>3}  {:>16}  {:>16}  {:>16}  {:>7}  {:>7}  {:>8}  {:>8}  {:>8}",
        "#", "P1 (m)", "P2 (m)", "P3 (m)", "A mm²", "ΔP kN", "Pblk kN", "Pmax kN", "Rbond kN"
    );

    for row in &report.rows {
        let g = &row.geometry;
        let s = &row.safety;
        println!(
            "{:>3}  {:>7.2},{:>8.2}  {:>7.2},{:>8.2}  {:>7.2},{:>8.2}  {:>7.0}  {:>7.2}  {:>8.2}  {:>8.2}  {:>8.2}",
            row.anchor_number,
            g.p1.x,
            g.p1.y,
            g.p2.x,
            g.p2.y,
            g.p3.x,
            g.p3.y,
            s.steel_area_mm2,
            s.slip_loss_kn,
            s.block_force_kn,
            s.max_steel_force_kn,
            s.bond_resistance_kn,
        );
        println!(
            "     block {}  bond {}",
            status_icon(s.block_check.is_ok()),
            status_icon(s.bond_check.is_ok())
        );
    }

    for failure in &report.failures {
        println!("{:>3}  not evaluated: {}", failure.anchor, failure.error);
    }

    println!();
    match (&report.bulb_load, &report.bulb_load_error) {
        (Some(bulb), _) => print_bulb_load(bulb),
        (None, Some(error)) => println!("Bulb load not computed: {}", error),
        (None, None) => {}
    }

    println!();
    println!("═══════════════════════════════════════════════════════════════════════════════");
    println!(
        "  RESULT: {} ({} of {} anchors failing, {} not evaluated)",
        if report.all_pass() { "PASS" } else { "FAIL" },
        report.failing_count(),
        report.rows.len() + report.failures.len(),
        report.failures.len()
    );
    println!("═══════════════════════════════════════════════════════════════════════════════");
}

fn print_bulb_load(bulb: &BulbLoadResult) {
    println!("Bulb load:");
    println!("  ΣV        = {:.2} kN", bulb.vertical_total_kn);
    println!("  ΣV / s    = {:.2} kN/m", bulb.vertical_per_meter_kn_m);
    println!("  g (wall)  = {:.2} kN/m", bulb.wall_self_load_kn_m);
    println!("  C (bulb)  = {:.2} kN", bulb.bulb_load_kn);
}

// =============================================================================
// EDITING
// =============================================================================

#[derive(Debug, clap::Args)]
pub struct Init {
    /// Interchange CSV file to create
    file: PathBuf,

    /// Section name
    #[arg(long, default_value = "Section 1")]
    section: String,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

impl Init {
    fn run(self) -> anyhow::Result<()> {
        if self.file.exists() && !self.force {
            bail!("{} already exists (use --force to overwrite)", self.file.display());
        }
        let _lock = FileLock::acquire(&self.file, user_id())
            .with_context(|| format!("cannot lock {}", self.file.display()))?;

        let mut dataset = Dataset::new(ProjectGlobals {
            section_name: self.section,
            ..ProjectGlobals::default()
        });
        dataset.add_anchor(Anchor::new(0.0, 4.0, -25.0, 10.0, 8.0));

        save_dataset(&dataset, &self.file).with_context(|| format!("failed to save {}", self.file.display()))?;
        println!("Created {}", self.file.display());
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
pub struct Add {
    /// Interchange CSV file
    file: PathBuf,

    /// Head x (m)
    #[arg(long, allow_hyphen_values = true)]
    x1: f64,

    /// Head y (m)
    #[arg(long, allow_hyphen_values = true)]
    y1: f64,

    /// Inclination (degrees, negative downward)
    #[arg(long, allow_hyphen_values = true)]
    angle: f64,

    /// Free length (m)
    #[arg(long)]
    free: f64,

    /// Bond length (m)
    #[arg(long)]
    bond: f64,

    /// Prestress (kN)
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_PRESTRESS_KN)]
    prestress: f64,

    /// Number of strands
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_STRAND_COUNT)]
    strands: u32,

    /// Area per strand (mm²), project default when omitted
    #[arg(long)]
    strand_area: Option<f64>,

    /// Drill diameter (mm)
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_DRILL_DIAMETER_MM)]
    drill: f64,

    /// Bond coefficient α
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_ALPHA)]
    alpha: f64,

    /// Skin friction τ (kPa)
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_SHEAR_STRESS_KPA)]
    tau: f64,

    /// Safety factor on bond
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_SAFETY_FACTOR)]
    fs: f64,
}

impl Add {
    fn run(self) -> anyhow::Result<()> {
        let anchor = Anchor::new(self.x1, self.y1, self.angle, self.free, self.bond)
            .with_prestress(self.prestress)
            .with_strands(self.strands, self.strand_area)
            .with_bond(self.drill, self.alpha, self.tau, self.fs);
        anchor.validate().context("invalid anchor")?;

        let path = self.file;
        edit(&path, |dataset| {
            let number = dataset.add_anchor(anchor);
            println!("Added anchor #{} to {}", number, path.display());
            Ok(())
        })
    }
}

#[derive(Debug, clap::Args)]
pub struct Remove {
    /// Interchange CSV file
    file: PathBuf,

    /// 1-based anchor number
    number: usize,
}

impl Remove {
    fn run(self) -> anyhow::Result<()> {
        let number = self.number;
        edit(&self.file, |dataset| match dataset.remove_anchor(number) {
            Some(_) => {
                println!("Removed anchor #{}", number);
                Ok(())
            }
            None => bail!("no anchor #{} (file has {})", number, dataset.anchor_count()),
        })
    }
}

// =============================================================================
// STAND-ALONE CHECKS
// =============================================================================

#[derive(Debug, clap::Args)]
pub struct Rebar {
    /// Expression, e.g. "2*f16+3*f10" or "f12/0.20"
    expression: String,
}

#[derive(Serialize)]
struct RebarOutput<'a> {
    expression: &'a str,
    area_cm2: f64,
    unit: AreaUnit,
}

impl Rebar {
    fn run(self, json: bool) -> anyhow::Result<()> {
        let expression = RebarExpression::parse(&self.expression)?;
        let area = expression.area_cm2()?;
        let unit = expression.unit();

        if json {
            return print_json(&RebarOutput {
                expression: &self.expression,
                area_cm2: area,
                unit,
            });
        }
        println!("{} = {:.2} {}", self.expression, area, unit);
        Ok(())
    }
}

#[derive(Debug, clap::Args)]
pub struct Micropile {
    /// Catalogue section, e.g. "CHS 139.7x9"
    #[arg(long, conflicts_with_all = ["diameter", "thickness"])]
    section: Option<String>,

    /// Outer diameter (mm)
    #[arg(long)]
    diameter: Option<f64>,

    /// Wall thickness (mm)
    #[arg(long)]
    thickness: Option<f64>,

    /// Sacrificial corrosion thickness (mm)
    #[arg(long, default_value_t = 1.0)]
    sacrificial: f64,

    /// Buckling length (m)
    #[arg(long, default_value_t = 6.0)]
    length: f64,

    /// Design axial load N_Ed (kN)
    #[arg(long, conflicts_with = "from")]
    load: Option<f64>,

    /// Take N_Ed from the bulb load of an interchange file
    #[arg(long)]
    from: Option<PathBuf>,

    /// Partial factor γ_M0
    #[arg(long, default_value_t = 1.0)]
    gamma: f64,

    /// Characteristic yield strength (MPa)
    #[arg(long, default_value_t = 560.0)]
    fyk: f64,

    /// Elastic modulus (GPa)
    #[arg(long, default_value_t = 210.0)]
    e: f64,
}

impl Micropile {
    fn design_load(&self) -> anyhow::Result<f64> {
        if let Some(path) = &self.from {
            let dataset = load(path)?;
            let report = evaluate_anchorage(&dataset.anchors, &dataset.globals);
            return match (report.bulb_load, report.bulb_load_error) {
                (Some(bulb), _) => Ok(bulb.bulb_load_kn),
                (None, Some(error)) => Err(error).context("bulb load not available"),
                (None, None) => bail!("bulb load not available"),
            };
        }
        Ok(self.load.unwrap_or(MicropileInput::default().design_load_kn))
    }

    fn run(self, json: bool) -> anyhow::Result<()> {
        let mut input = match &self.section {
            Some(designation) => {
                let catalog = builtin_micropile_sections();
                MicropileInput::from_section(catalog.lookup(designation)?)
            }
            None => MicropileInput::default(),
        };
        if let Some(d) = self.diameter {
            input.outer_diameter_mm = d;
        }
        if let Some(t) = self.thickness {
            input.thickness_mm = t;
        }
        input.sacrificial_mm = self.sacrificial;
        input.critical_length_m = self.length;
        input.gamma_m0 = self.gamma;
        input.fyk_mpa = self.fyk;
        input.e_gpa = self.e;
        input.design_load_kn = self.design_load()?;

        let result = check_micropile(&input)?;
        if json {
            return print_json(&result);
        }
        print_micropile(&input, &result);
        Ok(())
    }
}

fn print_micropile(input: &MicropileInput, result: &MicropileResult) {
    println!("═══════════════════════════════════════");
    println!("  MICROPILE CHS {}x{}", input.outer_diameter_mm, input.thickness_mm);
    println!("═══════════════════════════════════════");
    println!();
    println!("Section (corroded, c = {} mm):", input.sacrificial_mm);
    println!("  A = {:.2} cm²", result.area_cm2);
    println!("  I = {:.1} cm⁴", result.inertia_cm4);
    println!("  i = {:.4} m", result.radius_of_gyration_m);
    println!();
    println!("Resistances:");
    println!("  M_Rd = {:.1} kN·m", result.mrd_knm);
    println!("  V_Rd = {:.1} kN", result.vrd_kn);
    println!("  N_Rd = {:.1} kN", result.nrd_kn);
    println!();
    println!("Buckling:");
    println!("  λ̄ = {:.3}  φ = {:.3}  χ = {:.3}", result.slenderness, result.phi, result.chi);
    println!(
        "  N_b,Rd = {:.1} kN vs N_Ed = {:.1} kN {}",
        result.nbrd_kn,
        input.design_load_kn,
        status_icon(result.buckling_check.is_ok())
    );
    println!();
    println!("Joints:");
    println!("  External sleeve = {:.1} kN", result.sleeve_joint_kn);
    println!("  Threaded        = {:.1} kN", result.threaded_joint_kn);
}

#[derive(Debug, clap::Args)]
pub struct BondLength {
    /// Service load N_sk (kN)
    #[arg(long)]
    load: f64,

    /// Drill diameter (mm)
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_DRILL_DIAMETER_MM)]
    drill: f64,

    /// Bulb coefficient α
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_ALPHA)]
    alpha: f64,

    /// Skin friction τ (kPa)
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_SHEAR_STRESS_KPA)]
    tau: f64,

    /// Safety factor
    #[arg(long, default_value_t = anchor_core::project::DEFAULT_SAFETY_FACTOR)]
    fs: f64,
}

impl BondLength {
    fn run(self, json: bool) -> anyhow::Result<()> {
        let input = BondLengthInput {
            service_load_kn: self.load,
            drill_diameter_mm: self.drill,
            alpha: self.alpha,
            skin_friction_kpa: self.tau,
            safety_factor: self.fs,
        };
        let length = minimum_bond_length(&input)?;

        if json {
            return print_json(&serde_json::json!({ "input": input, "minimum_bond_length_m": length }));
        }
        println!("L_min = {:.2} m", length);
        Ok(())
    }
}

fn list_sections(json: bool) -> anyhow::Result<()> {
    let catalog = builtin_micropile_sections();
    if json {
        return print_json(&catalog.sections());
    }
    println!("{:<16} {:>9} {:>10} {:>8} {:>10}", "Section", "A cm²", "I cm⁴", "i cm", "W cm³");
    for section in catalog.sections() {
        println!(
            "{:<16} {:>9.2} {:>10.1} {:>8.2} {:>10.2}",
            section.designation(),
            section.area_cm2,
            section.inertia_cm4,
            section.radius_of_gyration_cm,
            section.section_modulus_cm3
        );
    }
    Ok(())
}
