//! Command-line driver: reads geometry and atmosphere files, solves the
//! clear-sky radiative transfer against the bundled solar spectrum and
//! writes the global, direct and diffuse irradiance tables.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use ndarray::Array2;
use tracing_subscriber::filter::LevelFilter;

use clearsky::{radtran, Atmosphere, Geometry, ToaSpectrum};

/// Missing or duplicated `--geo`, or an unreadable geometry file.
const EXIT_GEO: u8 = 1;
/// Missing or duplicated `--atm`, or an unreadable atmosphere file.
const EXIT_ATM: u8 = 2;
/// Missing or duplicated `--out`.
const EXIT_OUT: u8 = 3;
/// A result table could not be written.
const EXIT_WRITE: u8 = 4;

#[derive(Debug, Parser)]
#[command(name = "clearsky")]
#[command(version, about = "Clear-sky solar irradiance at the surface", long_about = None)]
struct Cli {
    /// Geometry input file (required exactly once)
    #[arg(short, long, action = ArgAction::Append)]
    geo: Vec<PathBuf>,

    /// Atmosphere input file (required exactly once)
    #[arg(short, long, action = ArgAction::Append)]
    atm: Vec<PathBuf>,

    /// Output path; tables are written with _glb, _dir and _dif suffixes
    #[arg(short, long, action = ArgAction::Append)]
    out: Vec<PathBuf>,

    /// Treat Rayleigh and aerosol scattering as independent processes
    #[arg(long)]
    no_coupling: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

/// Require an option given exactly once.
fn exactly_one<'a>(paths: &'a [PathBuf], option: &str) -> Result<&'a Path, String> {
    match paths {
        [path] => Ok(path),
        [] => Err(format!("missing required option '{option}'")),
        _ => Err(format!("option '{option}' given more than once")),
    }
}

fn fail(code: u8, message: &str) -> ExitCode {
    log::error!("{message}");
    ExitCode::from(code)
}

/// Render a value like C's `%+14.6E`: explicit sign, 6 fractional digits,
/// a signed two-digit exponent, right-aligned to 14 columns.
fn format_value(value: f64) -> String {
    let s = format!("{value:+.6E}");
    let body = match s.split_once('E') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}E{sign}{digits:0>2}")
        }
        None => s,
    };
    format!("{body:>14}")
}

/// Insert `_tag` between the file stem and the extension.
fn suffixed(path: &Path, tag: &str) -> PathBuf {
    let mut name = match path.file_stem() {
        Some(stem) => {
            let mut name = stem.to_os_string();
            name.push(format!("_{tag}"));
            name
        }
        None => format!("out_{tag}").into(),
    };
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Render one irradiance table, a row per tabulated wavelength and a
/// column per scenario.
fn render_table(values: &Array2<f64>) -> String {
    let mut out = String::new();
    for j in 0..values.ncols() {
        for i in 0..values.nrows() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format_value(values[[i, j]]));
        }
        out.push('\n');
    }
    out
}

fn write_table(path: &Path, values: &Array2<f64>) -> std::io::Result<()> {
    std::fs::write(path, render_table(values))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let geo_path = match exactly_one(&cli.geo, "--geo") {
        Ok(path) => path,
        Err(message) => return fail(EXIT_GEO, &message),
    };
    let atm_path = match exactly_one(&cli.atm, "--atm") {
        Ok(path) => path,
        Err(message) => return fail(EXIT_ATM, &message),
    };
    let out_path = match exactly_one(&cli.out, "--out") {
        Ok(path) => path,
        Err(message) => return fail(EXIT_OUT, &message),
    };

    let geo = match Geometry::from_file(geo_path) {
        Ok(geo) => geo,
        Err(e) => {
            let message = format!("geometry file '{}': {e}", geo_path.display());
            return fail(EXIT_GEO, &message);
        }
    };
    let atm = match Atmosphere::from_file(atm_path) {
        Ok(atm) => atm,
        Err(e) => {
            let message = format!("atmosphere file '{}': {e}", atm_path.display());
            return fail(EXIT_ATM, &message);
        }
    };

    let toa = match ToaSpectrum::kurucz() {
        Ok(toa) => toa,
        Err(e) => return fail(EXIT_WRITE, &format!("bundled solar spectrum: {e}")),
    };
    let window = (toa.wvln()[0], toa.wvln()[toa.len() - 1]);

    let irr = match radtran(&geo, &atm, toa, window, !cli.no_coupling) {
        Ok(irr) => irr,
        Err(e) => return fail(EXIT_ATM, &format!("cannot solve the model: {e}")),
    };

    for (tag, values) in [("glb", &irr.glb), ("dir", &irr.dir), ("dif", &irr.dif)] {
        let path = suffixed(out_path, tag);
        if let Err(e) = write_table(&path, values) {
            let message = format!("cannot write '{}': {e}", path.display());
            return fail(EXIT_WRITE, &message);
        }
        log::info!("wrote {}", path.display());
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exactly_one_counts_occurrences() {
        let none: Vec<PathBuf> = vec![];
        assert!(exactly_one(&none, "--geo").is_err());

        let one = vec![PathBuf::from("geo.dat")];
        assert_eq!(exactly_one(&one, "--geo").unwrap(), Path::new("geo.dat"));

        let two = vec![PathBuf::from("a"), PathBuf::from("b")];
        assert!(exactly_one(&two, "--geo").is_err());
    }

    #[test]
    fn values_render_like_fortran_tables() {
        assert_eq!(format_value(0.35255116315), " +3.525512E-01");
        assert_eq!(format_value(-1.0), " -1.000000E+00");
        assert_eq!(format_value(0.0), " +0.000000E+00");
        assert_eq!(format_value(2.5927425889159901e-05), " +2.592743E-05");
        assert_eq!(format_value(550.0), " +5.500000E+02");
    }

    #[test]
    fn tables_are_wavelength_major_without_an_index_column() {
        let values = ndarray::array![[1.0, 0.25], [-2.0, 0.5]];
        let rendered = render_table(&values);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], " +1.000000E+00  -2.000000E+00");
        assert_eq!(lines[1], " +2.500000E-01  +5.000000E-01");
    }

    #[test]
    fn output_names_carry_the_component_tag() {
        assert_eq!(
            suffixed(Path::new("results/run.dat"), "glb"),
            PathBuf::from("results/run_glb.dat")
        );
        assert_eq!(
            suffixed(Path::new("run"), "dif"),
            PathBuf::from("run_dif")
        );
    }
}
