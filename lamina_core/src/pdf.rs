//! # PDF Report Module
//!
//! Renders deflection studies to PDF using Typst.
//!
//! ## Architecture
//!
//! - The report is assembled as Typst markup from string templates
//! - Charts are drawn in Typst itself (see [`crate::charts`])
//! - Fonts come from `typst-assets` and are loaded once per process
//! - Output is raw PDF bytes (`Vec<u8>`)
//!
//! ## Example
//!
//! ```rust,no_run
//! use lamina_core::pdf::render_study_pdf;
//! use lamina_core::study::Study;
//!
//! let study = Study::with_default_case("Jane Engineer", "26-001", "Blade deflection");
//! let pdf_bytes = render_study_pdf(&study).unwrap();
//! std::fs::write("blade_report.pdf", pdf_bytes).unwrap();
//! ```

use chrono::Utc;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use typst::diag::{FileError, FileResult};
use typst::foundations::{Bytes, Datetime};
use typst::syntax::{FileId, Source};
use typst::text::{Font, FontBook};
use typst::utils::LazyHash;
use typst::{Library, LibraryExt, World};
use typst_pdf::PdfOptions;

use crate::calculations::beam::{BeamInput, SelfWeight};
use crate::calculations::deflection::{round_to, LoadScenario};
use crate::calculations::{analyze, CaseAnalysis};
use crate::equations::registry::EquationTracker;
use crate::errors::{CalcError, CalcResult};
use crate::study::{Study, StudySettings};
use crate::units::{meters_to_mm, Gigapascals, Mm4, Pascals, M4};

const CHART_WIDTH_PT: f64 = 430.0;
const CHART_HEIGHT_PT: f64 = 250.0;

/// Bundled fonts, parsed once
static FONTS: Lazy<Vec<Font>> = Lazy::new(|| {
    let fonts: Vec<Font> = typst_assets::fonts()
        .flat_map(|font_bytes| Font::iter(Bytes::new(font_bytes.to_vec())))
        .collect();
    debug!("Loaded {} bundled fonts", fonts.len());
    fonts
});

// ============================================================================
// Typst World Implementation
// ============================================================================

/// A minimal Typst world for compiling a single in-memory document.
struct PdfWorld {
    main: Source,
    book: LazyHash<FontBook>,
    fonts: &'static [Font],
    library: LazyHash<Library>,
}

impl PdfWorld {
    fn new(source: String) -> Self {
        let fonts: &'static [Font] = &FONTS;
        PdfWorld {
            main: Source::detached(source),
            book: LazyHash::new(FontBook::from_fonts(fonts)),
            fonts,
            library: LazyHash::new(Library::default()),
        }
    }
}

impl World for PdfWorld {
    fn library(&self) -> &LazyHash<Library> {
        &self.library
    }

    fn book(&self) -> &LazyHash<FontBook> {
        &self.book
    }

    fn main(&self) -> FileId {
        self.main.id()
    }

    fn source(&self, id: FileId) -> FileResult<Source> {
        if id == self.main.id() {
            Ok(self.main.clone())
        } else {
            Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
        }
    }

    fn file(&self, id: FileId) -> FileResult<Bytes> {
        Err(FileError::NotFound(id.vpath().as_rootless_path().into()))
    }

    fn font(&self, index: usize) -> Option<Font> {
        self.fonts.get(index).cloned()
    }

    fn today(&self, _offset: Option<i64>) -> Option<Datetime> {
        let now = Utc::now();
        Datetime::from_ymd(
            now.format("%Y").to_string().parse().ok()?,
            now.format("%m").to_string().parse().ok()?,
            now.format("%d").to_string().parse().ok()?,
        )
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Page setup and cover page
const COVER_TEMPLATE: &str = r##"
#set page(
  paper: "a4",
  margin: (top: 2.5cm, bottom: 2.5cm, left: 2.2cm, right: 2.2cm),
  header: align(right)[
    #text(size: 9pt, fill: gray)[Lamina Blade Deflection Study]
  ],
  footer: context [
    #line(length: 100%, stroke: 0.5pt + gray)
    #v(4pt)
    #grid(
      columns: (1fr, 1fr, 1fr),
      align(left)[#text(size: 9pt)[Job: {{JOB_ID}}]],
      align(center)[#text(size: 9pt)[Page #counter(page).display()]],
      align(right)[#text(size: 9pt)[{{DATE}}]],
    )
  ]
)

#set text(size: 10pt)
#set heading(numbering: "1.1")

#align(center)[
  #block(width: 100%, fill: rgb("#f0f0f0"), inset: 20pt, radius: 4pt)[
    #text(size: 22pt, weight: "bold")[Blade Deflection Study]
    #v(8pt)
    #text(size: 14pt)[{{TITLE}}]
  ]
]

#v(20pt)

#table(
  columns: (auto, 1fr),
  stroke: none,
  row-gutter: 4pt,
  [Engineer:], [{{ENGINEER}}],
  [Job ID:], [{{JOB_ID}}],
  [Date:], [{{DATE}}],
  [Stations per curve:], [{{SAMPLES}}],
)

#v(12pt)

Deflections follow Euler-Bernoulli beam theory for a prismatic blade with constant flexural
rigidity. Each load scenario is evaluated on its own; negative values point downward.

#v(12pt)

== Summary of Maximum Deflections

#table(
  columns: (1fr, auto, auto, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, left, right, right, right),
  table.header([*Case*], [*Support*], [*Load at midspan*], [*Load at tip*], [*Self-weight*]),
{{SUMMARY_ROWS}}
)

#text(size: 9pt, fill: gray)[Values in mm.]
"##;

/// Per-case section; charts and fit rows are injected
const CASE_TEMPLATE: &str = r##"
#pagebreak()

= Case: {{LABEL}}

== Input Parameters

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Parameter*], [*Value*], [*Unit*]),
  [Support], [{{SUPPORT}}], [],
  [Length ($L$)], [{{LENGTH}}], [m],
  [Width ($b$)], [{{WIDTH}}], [m],
  [Thickness ($t$)], [{{THICKNESS}}], [m],
  [Material], [{{MATERIAL}}], [],
  [Young's modulus ($E$)], [{{YOUNGS}}], [GPa],
  [Point load ($P$)], [{{LOAD}}], [N],
  [Load position ($a$)], [{{LOAD_POSITION}}], [m],
  [Self-weight ($w$)], [{{SELF_WEIGHT}}], [N/m],
)

== Section Properties

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, left),
  table.header([*Property*], [*Value*], [*Unit*]),
  [Second moment of area ($I = b t^3 \/ 12$)], [{{INERTIA}}], [mm#super[4]],
  [Flexural rigidity ($E I$)], [{{RIGIDITY}}], [N m#super[2]],
)

== Maximum Deflections

#table(
  columns: (1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right, right),
  table.header([*Scenario*], [*Deflection (m)*], [*Deflection (mm)*]),
{{MAX_ROWS}}
)

#v(8pt)

{{DEFLECTION_CHART}}

== Curve Fitting

Least-squares polynomials fitted to the load at midspan curve over {{SAMPLES}} stations.

#table(
  columns: (auto, 1fr, auto, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, left, right, right),
  table.header([*Fit*], [*Polynomial (m)*], [*$R^2$*], [*RMSE (m)*]),
{{FIT_ROWS}}
)

#v(8pt)

{{FIT_CHART}}

{{IDEAL_SECTION}}
"##;

const IDEAL_TEMPLATE: &str = r##"
== Ideal Beam

The exact load at midspan curve compared with its straight-line continuation
$y approx P a^2 (3 x - a) \/ (6 E I)$, with and without self-weight superposed.

#table(
  columns: (1fr, auto),
  inset: 6pt,
  stroke: 0.5pt,
  align: (left, right),
  table.header([*Quantity*], [*Value*]),
  [Load at tip + self-weight, maximum], [{{COMBINED_MAX}} m],
  [Load at midspan + self-weight, free end], [{{COMBINED_TIP}} m],
  [Largest approximation error], [{{APPROX_ERROR}} mm],
)

#v(8pt)

{{IDEAL_CHART}}
"##;

// ============================================================================
// Report Assembly
// ============================================================================

/// Build the complete Typst source for a study report.
///
/// Cases are analyzed in label order. Every formula applied is collected
/// into the equations appendix.
///
/// # Errors
///
/// * `InvalidInput` - if the study has no cases or a case fails validation
pub fn study_report_typst(study: &Study) -> CalcResult<String> {
    if study.cases.is_empty() {
        return Err(CalcError::invalid_input("cases", "0", "Study has no cases to report"));
    }

    let settings = &study.settings;
    let mut tracker = EquationTracker::new();

    let analyses = study
        .sorted_cases()
        .into_iter()
        .map(|case| {
            analyze(case, settings, &mut tracker).map_err(|e| {
                warn!("Case '{}' failed: {}", case.label, e);
                e
            })
        })
        .collect::<CalcResult<Vec<CaseAnalysis>>>()?;

    let date = Utc::now().format("%Y-%m-%d").to_string();

    let mut source = fill_template(
        COVER_TEMPLATE,
        &[
            ("JOB_ID", escape_typst(&study.meta.job_id)),
            ("DATE", date),
            ("TITLE", escape_typst(&study.meta.title)),
            ("ENGINEER", escape_typst(&study.meta.engineer)),
            ("SAMPLES", settings.samples.to_string()),
            ("SUMMARY_ROWS", build_summary_rows(&analyses)),
        ],
    );

    for analysis in &analyses {
        source.push_str(&build_case_section(analysis, settings));
    }

    source.push_str(&tracker.generate_appendix_typst());

    Ok(source)
}

/// Render every case in a study to one PDF.
pub fn render_study_pdf(study: &Study) -> CalcResult<Vec<u8>> {
    let source = study_report_typst(study)?;
    let pdf = compile_pdf(source)?;
    info!(
        "Rendered report '{}' ({} cases, {} bytes)",
        study.meta.title,
        study.case_count(),
        pdf.len()
    );
    Ok(pdf)
}

/// Render a single case to PDF.
///
/// # Example
///
/// ```rust,no_run
/// use lamina_core::calculations::BeamInput;
/// use lamina_core::pdf::render_case_pdf;
/// use lamina_core::study::StudySettings;
///
/// let pdf = render_case_pdf(&BeamInput::default(), &StudySettings::default(), "Jane", "26-001").unwrap();
/// assert!(pdf.starts_with(b"%PDF"));
/// ```
pub fn render_case_pdf(
    input: &BeamInput,
    settings: &StudySettings,
    engineer: &str,
    job_id: &str,
) -> CalcResult<Vec<u8>> {
    let mut study = Study::new(engineer, job_id, input.label.clone());
    study.settings = settings.clone();
    study.add_case(input.clone());
    render_study_pdf(&study)
}

/// Compile Typst source to PDF bytes.
pub fn compile_pdf(source: String) -> CalcResult<Vec<u8>> {
    let world = PdfWorld::new(source);
    let warned = typst::compile(&world);

    for warning in &warned.warnings {
        warn!("Typst warning: {}", warning.message);
    }

    let document = warned.output.map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::internal(format!("Typst compilation failed: {}", error_msgs.join("; ")))
    })?;

    typst_pdf::pdf(&document, &PdfOptions::default()).map_err(|errors| {
        let error_msgs: Vec<String> = errors.iter().map(|e| e.message.to_string()).collect();
        CalcError::internal(format!("PDF rendering failed: {}", error_msgs.join("; ")))
    })
}

fn build_case_section(analysis: &CaseAnalysis, settings: &StudySettings) -> String {
    let input = &analysis.input;
    let result = &analysis.deflection;
    let decimals = settings.display_decimals;

    let material = match (&input.material, input.self_weight) {
        (Some(material), _) => material.display_name(),
        (None, SelfWeight::FromDensity { density_kg_m3 }) => format!("Density {} kg/m³", density_kg_m3),
        (None, SelfWeight::LineLoad { .. }) => "Not specified".to_string(),
    };

    let max_rows = LoadScenario::ALL
        .iter()
        .map(|&scenario| {
            let value = result.max.get(scenario);
            format!(
                "  [{}], [{:.*}], [{:.3}],",
                scenario.display_name(),
                decimals,
                round_to(value, decimals),
                meters_to_mm(value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let fit_rows = analysis
        .fits
        .fits
        .iter()
        .map(|fit| {
            format!(
                "  [{}], [`{}`], [{:.6}], [{:.3e}],",
                fit.name(),
                fit.formula(),
                fit.r_squared,
                fit.rmse
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let ideal_section = match &analysis.ideal {
        Some(ideal) => fill_template(
            IDEAL_TEMPLATE,
            &[
                ("COMBINED_MAX", format!("{:.*}", decimals, round_to(ideal.combined_max_deflection_m, decimals))),
                ("COMBINED_TIP", format!("{:.*}", decimals, round_to(ideal.combined_tip_deflection_m, decimals))),
                ("APPROX_ERROR", format!("{:.3}", meters_to_mm(ideal.max_approximation_error_m()))),
                ("IDEAL_CHART", ideal.chart().to_typst(CHART_WIDTH_PT, CHART_HEIGHT_PT)),
            ],
        ),
        None => String::new(),
    };

    let youngs: Gigapascals = Pascals(input.youngs_modulus_pa).into();
    let inertia: Mm4 = M4(result.moment_of_inertia_m4).into();

    fill_template(
        CASE_TEMPLATE,
        &[
            ("LABEL", escape_typst(&input.label)),
            ("SUPPORT", input.support.display_name().to_string()),
            ("LENGTH", format!("{}", input.length_m)),
            ("WIDTH", format!("{}", input.width_m)),
            ("THICKNESS", format!("{}", input.thickness_m)),
            ("MATERIAL", escape_typst(&material)),
            ("YOUNGS", format!("{:.1}", youngs.value())),
            ("LOAD", format!("{}", input.point_load_n)),
            ("LOAD_POSITION", format!("{:.4}", result.load_position_m)),
            ("SELF_WEIGHT", format!("{:.4}", result.self_weight_n_per_m)),
            ("INERTIA", format!("{:.4}", inertia.value())),
            ("RIGIDITY", format!("{:.4}", result.flexural_rigidity_nm2)),
            ("MAX_ROWS", max_rows),
            ("DEFLECTION_CHART", result.chart().to_typst(CHART_WIDTH_PT, CHART_HEIGHT_PT)),
            ("SAMPLES", settings.samples.to_string()),
            ("FIT_ROWS", fit_rows),
            ("FIT_CHART", analysis.fits.chart().to_typst(CHART_WIDTH_PT, CHART_HEIGHT_PT)),
            ("IDEAL_SECTION", ideal_section),
        ],
    )
}

/// Replace `{{KEY}}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so user text that happens to
/// contain `{{...}}` is kept literally. Unknown keys are left in place.
fn fill_template(template: &str, values: &[(&str, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let value = after
            .find("}}")
            .and_then(|end| values.iter().find(|(key, _)| *key == &after[..end]).map(|(_, v)| (v, end)));

        match value {
            Some((v, end)) => {
                out.push_str(v);
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Summary table rows for the cover page, values in mm
fn build_summary_rows(analyses: &[CaseAnalysis]) -> String {
    analyses
        .iter()
        .map(|analysis| {
            let max = &analysis.deflection.max;
            format!(
                "  [{}], [{}], [{:.3}], [{:.3}], [{:.3}],",
                escape_typst(&analysis.input.label),
                analysis.input.support.display_name(),
                meters_to_mm(max.midspan_load_m),
                meters_to_mm(max.tip_load_m),
                meters_to_mm(max.self_weight_m)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Escape special Typst characters in user-provided text
pub(crate) fn escape_typst(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '*' => "\\*".to_string(),
            '_' => "\\_".to_string(),
            '#' => "\\#".to_string(),
            '$' => "\\$".to_string(),
            '@' => "\\@".to_string(),
            '<' => "\\<".to_string(),
            '>' => "\\>".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '\\' => "\\\\".to_string(),
            '`' => "\\`".to_string(),
            '/' => "\\/".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::beam::Support;
    use crate::materials::Material;

    fn sample_study() -> Study {
        let mut study = Study::new("Test Engineer", "TEST-001", "Blade deflection");
        study.add_case(BeamInput::default());
        study.add_case(BeamInput {
            label: "Steel, pinned".to_string(),
            support: Support::SimplySupported,
            ..BeamInput::default().with_material(Material::Steel)
        });
        study
    }

    #[test]
    fn test_escape_typst() {
        assert_eq!(escape_typst("B_1 #2 [a]"), "B\\_1 \\#2 \\[a\\]");
        assert_eq!(escape_typst("plain"), "plain");
        assert_eq!(escape_typst("a//b"), "a\\/\\/b");
    }

    #[test]
    fn test_report_source_contents() {
        let source = study_report_typst(&sample_study()).unwrap();

        assert!(source.contains("Blade Deflection Study"));
        assert!(source.contains("= Case: Blade"));
        assert!(source.contains("= Case: Steel, pinned"));
        assert!(source.contains("Ideal Beam"));
        assert!(source.contains("Appendix: List of Equations"));
        assert!(!source.contains("{{"), "unreplaced placeholder in report");
    }

    #[test]
    fn test_ideal_section_only_for_cantilevers() {
        let mut study = Study::new("E", "J", "Pinned only");
        study.add_case(BeamInput {
            support: Support::SimplySupported,
            ..Default::default()
        });
        let source = study_report_typst(&study).unwrap();
        assert!(!source.contains("== Ideal Beam"));
    }

    #[test]
    fn test_fill_template_single_pass() {
        let filled = fill_template(
            "{{A}} / {{B}} / {{C}}",
            &[("A", "{{B}}".to_string()), ("B", "two".to_string())],
        );
        assert_eq!(filled, "{{B}} / two / {{C}}");
    }

    #[test]
    fn test_placeholders_in_user_text_kept_literally() {
        let mut study = Study::new("E", "J", "Title {{SUMMARY_ROWS}}");
        study.add_case(BeamInput {
            label: "Case {{SAMPLES}}".to_string(),
            ..Default::default()
        });
        let source = study_report_typst(&study).unwrap();

        assert!(source.contains("Title {{SUMMARY_ROWS}}"));
        assert!(source.contains("= Case: Case {{SAMPLES}}"));
    }

    #[test]
    fn test_markup_characters_in_labels() {
        let mut study = Study::new("E \\$1", "J*", "Blade [test]");
        study.add_case(BeamInput {
            label: "Blade $2 *thin* [B] #1 <a>".to_string(),
            ..Default::default()
        });
        study.add_case(BeamInput {
            label: "Blade_A".to_string(),
            ..Default::default()
        });

        let pdf = render_study_pdf(&study);
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let single = BeamInput {
            label: "Case $x$ [1]".to_string(),
            ..Default::default()
        };
        assert!(render_case_pdf(&single, &StudySettings::default(), "E", "J").is_ok());
    }

    #[test]
    fn test_inertia_shown_in_mm4() {
        let source = study_report_typst(&sample_study()).unwrap();
        // 50 x 1 mm blade: I = 50/12 mm^4
        assert!(source.contains("[4.1667], [mm#super[4]]"));
    }

    #[test]
    fn test_empty_study_rejected() {
        let err = study_report_typst(&Study::default()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_invalid_case_rejected() {
        let mut study = Study::default();
        study.add_case(BeamInput {
            length_m: -1.0,
            ..Default::default()
        });
        assert!(study_report_typst(&study).is_err());
    }

    #[test]
    fn test_pdf_generation() {
        let pdf = render_study_pdf(&sample_study());
        assert!(pdf.is_ok(), "PDF generation failed: {:?}", pdf.err());

        let pdf_bytes = pdf.unwrap();
        assert!(pdf_bytes.starts_with(b"%PDF"), "Output is not a valid PDF");
        assert!(pdf_bytes.len() > 1000, "PDF seems too small");
    }

    #[test]
    fn test_case_pdf_generation() {
        let pdf = render_case_pdf(&BeamInput::default(), &StudySettings::default(), "Test", "T-1").unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
