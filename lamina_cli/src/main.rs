//! # Lamina CLI
//!
//! Command-line front end for `lamina_core`: deflection curves, polynomial
//! fits, the ideal beam comparison and PDF reports.
//!
//! Parameters are layered: built-in defaults, then the cases and settings of
//! a `--study` file, then individual flags such as `--length` or `--load`.
//!
//! ```bash
//! lamina deflection --thickness 0.0008 --load=-1.5
//! lamina fit --degrees 1,2,3
//! lamina report --study blade.lam --out blade.pdf
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use log::{debug, info};
use serde::Serialize;

use lamina_core::calculations::beam::{BeamInput, SelfWeight, Support};
use lamina_core::calculations::deflection::{calculate, round_to, DeflectionResult, LoadScenario};
use lamina_core::calculations::{compare, fit_midspan_curve, CurveFit, IdealBeamComparison};
use lamina_core::equations::generate_equations_markdown;
use lamina_core::file_io::{load_study, save_study};
use lamina_core::materials::Material;
use lamina_core::pdf::{render_study_pdf, study_report_typst};
use lamina_core::study::Study;
use lamina_core::units::{format_gpa, format_mm, format_mm4};
use lamina_core::{CalcError, CalcResult};

#[derive(Parser)]
#[command(
    name = "lamina",
    author,
    version,
    about = "Blade deflection curves, polynomial fits and PDF reports"
)]
struct Cli {
    /// Increase log output (-v info, -vv debug). RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Maximum deflections and curves for the three load scenarios
    Deflection(DeflectionArgs),

    /// Polynomial fits of the load at midspan curve
    Fit(FitArgs),

    /// Exact load at midspan curve against its straight-line approximation
    Ideal(CaseArgs),

    /// Render a PDF report with charts and the equations appendix
    Report(ReportArgs),

    /// Write a study file holding the default blade
    Init(InitArgs),

    /// Print the equations reference (Markdown)
    Equations(EquationsArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SupportArg {
    Cantilever,
    SimplySupported,
}

impl From<SupportArg> for Support {
    fn from(arg: SupportArg) -> Self {
        match arg {
            SupportArg::Cantilever => Support::Cantilever,
            SupportArg::SimplySupported => Support::SimplySupported,
        }
    }
}

/// Case selection and parameter overrides shared by every analysis command
#[derive(Args, Debug, Clone, Default)]
struct CaseArgs {
    /// Study file (.lam) providing cases and settings
    #[arg(long, value_hint = ValueHint::FilePath)]
    study: Option<PathBuf>,

    /// Only analyze the study case with this label
    #[arg(long)]
    case: Option<String>,

    /// Label for the case (single-case runs only)
    #[arg(long)]
    label: Option<String>,

    /// Blade length L (m)
    #[arg(long)]
    length: Option<f64>,

    /// Section width b (m)
    #[arg(long)]
    width: Option<f64>,

    /// Section thickness t (m)
    #[arg(long)]
    thickness: Option<f64>,

    /// Material preset: steel, stainless, spring-steel, aluminum, brass, titanium
    #[arg(long)]
    material: Option<Material>,

    /// Young's modulus E (Pa), overrides the material preset
    #[arg(long)]
    youngs_modulus: Option<f64>,

    /// Point load P (N), negative = downward
    #[arg(long, allow_negative_numbers = true)]
    load: Option<f64>,

    /// Self-weight line load w (N/m), negative = downward
    #[arg(long, allow_negative_numbers = true, conflicts_with = "density")]
    self_weight: Option<f64>,

    /// Derive the self-weight from a density (kg/m^3)
    #[arg(long)]
    density: Option<f64>,

    /// Boundary conditions
    #[arg(long, value_enum)]
    support: Option<SupportArg>,

    /// Intermediate load position as a fraction of the length, in (0, 1]
    #[arg(long)]
    load_position: Option<f64>,

    /// Stations along the blade
    #[arg(long)]
    samples: Option<usize>,

    /// Print JSON instead of tables
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Clone)]
struct DeflectionArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Also print the sampled curves station by station
    #[arg(long)]
    stations: bool,
}

#[derive(Args, Debug, Clone)]
struct FitArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Polynomial degrees, comma separated (default from the study, else 1,2)
    #[arg(long, value_delimiter = ',')]
    degrees: Option<Vec<usize>>,
}

#[derive(Args, Debug, Clone)]
struct ReportArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Output file
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    out: PathBuf,

    /// Engineer name, overrides the study metadata
    #[arg(long)]
    engineer: Option<String>,

    /// Job ID, overrides the study metadata
    #[arg(long)]
    job_id: Option<String>,

    /// Report title, overrides the study metadata
    #[arg(long)]
    title: Option<String>,

    /// Write the Typst source instead of compiling to PDF
    #[arg(long)]
    typst: bool,
}

#[derive(Args, Debug, Clone)]
struct InitArgs {
    /// Study file to create
    #[arg(short, long, default_value = "blade.lam", value_hint = ValueHint::FilePath)]
    out: PathBuf,

    #[arg(long, default_value = "")]
    engineer: String,

    #[arg(long, default_value = "")]
    job_id: String,

    #[arg(long, default_value = "Blade deflection")]
    title: String,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug, Clone)]
struct EquationsArgs {
    /// Write to a file instead of stdout
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    out: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
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

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn run(command: Command) -> CalcResult<()> {
    match command {
        Command::Deflection(args) => run_deflection(&args),
        Command::Fit(args) => run_fit(&args),
        Command::Ideal(args) => run_ideal(&args),
        Command::Report(args) => run_report(&args),
        Command::Init(args) => run_init(&args),
        Command::Equations(args) => run_equations(&args),
    }
}

// ============================================================================
// Parameter layering
// ============================================================================

/// Defaults, then the study file, then flags.
fn load_context(args: &CaseArgs) -> CalcResult<Study> {
    let mut study = match &args.study {
        Some(path) => {
            info!("Loading study {}", path.display());
            load_study(path)?
        }
        None => Study::with_default_case("", "", "Blade deflection"),
    };

    if let Some(label) = &args.case {
        study.cases.retain(|_, case| &case.label == label);
        if study.cases.is_empty() {
            return Err(CalcError::invalid_input("case", label.clone(), "No case with this label in the study"));
        }
    }

    if study.cases.is_empty() {
        return Err(CalcError::invalid_input("cases", "0", "Study has no cases"));
    }

    if args.label.is_some() && study.cases.len() > 1 {
        return Err(CalcError::invalid_input(
            "label",
            args.label.clone().unwrap_or_default(),
            "--label needs a single case; select one with --case",
        ));
    }

    for case in study.cases.values_mut() {
        apply_overrides(case, args);
    }

    if let Some(samples) = args.samples {
        study.settings.samples = samples;
    }
    study.settings.validate()?;

    debug!("Resolved {} case(s), {} samples", study.cases.len(), study.settings.samples);
    Ok(study)
}

fn apply_overrides(case: &mut BeamInput, args: &CaseArgs) {
    if let Some(material) = args.material {
        *case = case.clone().with_material(material);
    }
    if let Some(label) = &args.label {
        case.label = label.clone();
    }
    if let Some(length) = args.length {
        case.length_m = length;
    }
    if let Some(width) = args.width {
        case.width_m = width;
    }
    if let Some(thickness) = args.thickness {
        case.thickness_m = thickness;
    }
    if let Some(e) = args.youngs_modulus {
        case.youngs_modulus_pa = e;
    }
    if let Some(load) = args.load {
        case.point_load_n = load;
    }
    if let Some(w) = args.self_weight {
        case.self_weight = SelfWeight::LineLoad { n_per_m: w };
    }
    if let Some(density) = args.density {
        case.self_weight = SelfWeight::FromDensity { density_kg_m3: density };
    }
    if let Some(support) = args.support {
        case.support = support.into();
    }
    if let Some(ratio) = args.load_position {
        case.load_position_ratio = ratio;
    }
}

/// Results as a JSON array, one element per case
fn print_json<T: Serialize>(items: &[T]) -> CalcResult<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

fn rule() {
    println!("═══════════════════════════════════════════════");
}

fn banner(title: &str) {
    rule();
    println!("  {}", title);
    rule();
    println!();
}

/// Metres rounded for display, e.g. "-0.01600 m"
fn meters(value: f64, decimals: usize) -> String {
    format!("{:.*} m", decimals, round_to(value, decimals))
}

// ============================================================================
// Commands
// ============================================================================

fn run_deflection(args: &DeflectionArgs) -> CalcResult<()> {
    let study = load_context(&args.case)?;
    let decimals = study.settings.display_decimals;

    let results = study
        .sorted_cases()
        .into_iter()
        .map(|case| calculate(case, study.settings.samples).map(|r| (case, r)))
        .collect::<CalcResult<Vec<_>>>()?;

    if args.case.json {
        let results: Vec<&DeflectionResult> = results.iter().map(|(_, r)| r).collect();
        return print_json(&results);
    }

    for (case, result) in &results {
        banner(&format!("BLADE DEFLECTION: {}", case.label));
        print_inputs(case, result);

        println!("Maximum deflections:");
        for scenario in LoadScenario::ALL {
            let value = result.max.get(scenario);
            println!(
                "  {:<18} {:>14}  ({})",
                scenario.display_name(),
                meters(value, decimals),
                format_mm(value, 3)
            );
        }
        println!();

        if args.stations {
            print_stations(result, decimals);
        }
    }

    Ok(())
}

fn print_inputs(case: &BeamInput, result: &DeflectionResult) {
    println!("Input:");
    println!("  Support:     {}", case.support.display_name());
    println!("  Length:      {} m", case.length_m);
    println!(
        "  Section:     {} x {}",
        format_mm(case.width_m, 3),
        format_mm(case.thickness_m, 3)
    );
    if let Some(material) = &case.material {
        println!("  Material:    {}", material.display_name());
    }
    println!("  E:           {}", format_gpa(case.youngs_modulus_pa));
    println!(
        "  Point load:  {} N (at {:.4} m, and at the tip)",
        case.point_load_n, result.load_position_m
    );
    println!("  Self-weight: {:.4} N/m", result.self_weight_n_per_m);
    println!();
    println!("Section:");
    println!("  I  = {}", format_mm4(result.moment_of_inertia_m4));
    println!("  EI = {:.4} N m^2", result.flexural_rigidity_nm2);
    println!();
}

fn print_stations(result: &DeflectionResult, decimals: usize) {
    println!(
        "  {:>10} {:>14} {:>14} {:>14}",
        "x (m)", "midspan (m)", "tip (m)", "self-wt (m)"
    );
    let rows = result
        .x_m
        .iter()
        .zip(&result.midspan_load.points)
        .zip(&result.tip_load.points)
        .zip(&result.self_weight.points);
    for (((x, m), t), w) in rows {
        println!(
            "  {:>10.5} {:>14.*} {:>14.*} {:>14.*}",
            x,
            decimals,
            round_to(m.1, decimals),
            decimals,
            round_to(t.1, decimals),
            decimals,
            round_to(w.1, decimals)
        );
    }
    println!();
}

fn run_fit(args: &FitArgs) -> CalcResult<()> {
    let mut study = load_context(&args.case)?;
    if let Some(degrees) = &args.degrees {
        study.settings.fit_degrees = degrees.clone();
    }
    study.settings.validate()?;

    let fits = study
        .sorted_cases()
        .into_iter()
        .map(|case| {
            let result = calculate(case, study.settings.samples)?;
            fit_midspan_curve(&result, &study.settings.fit_degrees).map(|fit| (case, fit))
        })
        .collect::<CalcResult<Vec<(&BeamInput, CurveFit)>>>()?;

    if args.case.json {
        let fits: Vec<&CurveFit> = fits.iter().map(|(_, f)| f).collect();
        return print_json(&fits);
    }

    for (case, curve_fit) in &fits {
        banner(&format!("CURVE FIT: {} ({})", case.label, curve_fit.source.display_name()));
        for fit in &curve_fit.fits {
            println!("{}:", fit.name());
            println!("  {}", fit.formula());
            let errors = fit.standard_errors();
            for (k, c) in fit.coefficients.iter().enumerate() {
                let power = fit.degree - k;
                match errors.as_ref().and_then(|e| e.get(k)) {
                    Some(err) => println!("  c[x^{}] = {:>13.6e} ± {:.3e}", power, c, err),
                    None => println!("  c[x^{}] = {:>13.6e}", power, c),
                }
            }
            println!("  R^2  = {:.6}", fit.r_squared);
            println!("  RMSE = {:.4e} m", fit.rmse);
            println!();
        }
    }

    Ok(())
}

fn run_ideal(args: &CaseArgs) -> CalcResult<()> {
    let study = load_context(args)?;
    let decimals = study.settings.display_decimals;

    let comparisons = study
        .sorted_cases()
        .into_iter()
        .map(|case| {
            let result = calculate(case, study.settings.samples)?;
            compare(&result).map(|c| (case, c))
        })
        .collect::<CalcResult<Vec<(&BeamInput, IdealBeamComparison)>>>()?;

    if args.json {
        let comparisons: Vec<&IdealBeamComparison> = comparisons.iter().map(|(_, c)| c).collect();
        return print_json(&comparisons);
    }

    for (case, comparison) in &comparisons {
        banner(&format!("IDEAL BEAM: {}", case.label));
        println!(
            "  Load at tip + self-weight, maximum:      {}",
            meters(comparison.combined_max_deflection_m, decimals)
        );
        println!(
            "  Load at midspan + self-weight, free end: {}",
            meters(comparison.combined_tip_deflection_m, decimals)
        );
        println!(
            "  Largest approximation error:             {}",
            format_mm(comparison.max_approximation_error_m(), 3)
        );
        println!();
    }

    Ok(())
}

fn run_report(args: &ReportArgs) -> CalcResult<()> {
    let mut study = load_context(&args.case)?;
    if let Some(engineer) = &args.engineer {
        study.meta.engineer = engineer.clone();
    }
    if let Some(job_id) = &args.job_id {
        study.meta.job_id = job_id.clone();
    }
    if let Some(title) = &args.title {
        study.meta.title = title.clone();
    }

    let bytes = if args.typst {
        study_report_typst(&study)?.into_bytes()
    } else {
        render_study_pdf(&study)?
    };

    write_file(&args.out, &bytes)?;
    println!("Wrote {} ({} bytes, {} cases)", args.out.display(), bytes.len(), study.case_count());
    Ok(())
}

fn run_init(args: &InitArgs) -> CalcResult<()> {
    if args.out.exists() && !args.force {
        return Err(CalcError::file_error(
            "create",
            args.out.display().to_string(),
            "File exists (use --force to overwrite)",
        ));
    }

    let study = Study::with_default_case(args.engineer.clone(), args.job_id.clone(), args.title.clone());
    save_study(&study, &args.out)?;
    println!("Created {} with {} case", args.out.display(), study.case_count());
    Ok(())
}

fn run_equations(args: &EquationsArgs) -> CalcResult<()> {
    let markdown = generate_equations_markdown();
    match &args.out {
        Some(path) => {
            write_file(path, markdown.as_bytes())?;
            println!("Wrote {}", path.display());
        }
        None => print!("{}", markdown),
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> CalcResult<()> {
    fs::write(path, bytes).map_err(|e| CalcError::file_error("write", path.display().to_string(), e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_negative_load() {
        let cli = Cli::try_parse_from(["lamina", "deflection", "--load", "-1.5", "--support", "simply-supported"]).unwrap();
        match cli.command {
            Command::Deflection(args) => {
                assert_eq!(args.case.load, Some(-1.5));
                assert!(matches!(args.case.support, Some(SupportArg::SimplySupported)));
            }
            _ => panic!("expected deflection command"),
        }
    }

    #[test]
    fn test_parse_fit_degrees() {
        let cli = Cli::try_parse_from(["lamina", "fit", "--degrees", "1,2,3"]).unwrap();
        match cli.command {
            Command::Fit(args) => assert_eq!(args.degrees, Some(vec![1, 2, 3])),
            _ => panic!("expected fit command"),
        }
    }

    #[test]
    fn test_self_weight_conflicts_with_density() {
        let parsed = Cli::try_parse_from(["lamina", "ideal", "--self-weight", "-0.2", "--density", "7850"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_defaults_without_study() {
        let study = load_context(&CaseArgs::default()).unwrap();
        assert_eq!(study.case_count(), 1);
        assert_eq!(study.sorted_cases()[0], &BeamInput::default());
    }

    #[test]
    fn test_overrides_applied_in_order() {
        let args = CaseArgs {
            material: Some(Material::Aluminum),
            youngs_modulus: Some(70e9),
            self_weight: Some(-0.3),
            thickness: Some(0.002),
            samples: Some(11),
            ..Default::default()
        };
        let study = load_context(&args).unwrap();
        let case = study.sorted_cases()[0];

        assert_eq!(case.youngs_modulus_pa, 70e9);
        assert_eq!(case.self_weight, SelfWeight::LineLoad { n_per_m: -0.3 });
        assert_eq!(case.thickness_m, 0.002);
        assert_eq!(case.material, Some(Material::Aluminum));
        assert_eq!(study.settings.samples, 11);
    }

    #[test]
    fn test_study_settings_validated_for_every_command() {
        let path = std::env::temp_dir().join("lamina_cli_test_bad_settings.lam");
        let mut study = Study::with_default_case("E", "J", "Bad settings");
        study.settings.display_decimals = 400;
        save_study(&study, &path).unwrap();

        let args = CaseArgs {
            study: Some(path.clone()),
            ..Default::default()
        };
        let err = load_context(&args).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");

        assert!(run_deflection(&DeflectionArgs { case: args.clone(), stations: false }).is_err());
        assert!(run_ideal(&args).is_err());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_samples_flag_validated() {
        let args = CaseArgs {
            samples: Some(1),
            ..Default::default()
        };
        assert!(load_context(&args).is_err());
    }

    #[test]
    fn test_json_is_array_for_single_case() {
        let study = load_context(&CaseArgs::default()).unwrap();
        let results: Vec<DeflectionResult> = study
            .sorted_cases()
            .into_iter()
            .map(|case| calculate(case, study.settings.samples).unwrap())
            .collect();
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().map(|a| a.len()), Some(1));
        assert!(print_json(&results).is_ok());
    }

    #[test]
    fn test_unknown_case_label() {
        let args = CaseArgs {
            case: Some("Missing".to_string()),
            ..Default::default()
        };
        let err = load_context(&args).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_study_file_layering() {
        let path = std::env::temp_dir().join("lamina_cli_test_layering.lam");
        let mut study = Study::new("E", "J", "Layering");
        study.settings.samples = 21;
        study.add_case(BeamInput {
            label: "A".to_string(),
            ..Default::default()
        });
        study.add_case(BeamInput {
            label: "B".to_string(),
            length_m: 0.2,
            ..Default::default()
        });
        save_study(&study, &path).unwrap();

        let args = CaseArgs {
            study: Some(path.clone()),
            case: Some("B".to_string()),
            load: Some(-1.0),
            ..Default::default()
        };
        let resolved = load_context(&args).unwrap();
        let case = resolved.sorted_cases()[0];

        assert_eq!(resolved.case_count(), 1);
        assert_eq!(case.length_m, 0.2);
        assert_eq!(case.point_load_n, -1.0);
        assert_eq!(resolved.settings.samples, 21);

        let _ = fs::remove_file(&path);
    }
}
