use kurbo::Point;
use libtest_mimic::{Arguments, Failed, Trial};
use pathbool::{BooleanOptions, BooleanOutput, Path};
use serde::{Deserialize, Serialize};
use std::path::{Path as FsPath, PathBuf};

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
enum Operation {
    Union,
    Intersection,
    Difference,
    RemoveCrossings,
}

#[derive(Serialize, Deserialize, Debug)]
enum Assertion {
    NoPanic,
    /// No diagnostics.
    Clean,
    Components(usize),
    Area { expected: f64, tolerance: f64 },
    Winding { point: (f64, f64), expected: i32 },
}

#[derive(Serialize, Deserialize, Debug)]
struct RegressionCaseDeclaration {
    svg_path_1: String,
    svg_path_2: Option<String>,
    op: Operation,
    #[serde(default)]
    options: BooleanOptions,
    #[serde(default)]
    assert: Vec<Assertion>,
}

impl RegressionCaseDeclaration {
    fn run(&self) -> Result<BooleanOutput, Failed> {
        let p1 = Path::from_svg(&self.svg_path_1)?;
        let p2 = match &self.svg_path_2 {
            Some(s) => Path::from_svg(s)?,
            None => Path::default(),
        };
        let opts = &self.options;
        Ok(match self.op {
            Operation::Union => pathbool::union(&p1, &p2, opts),
            Operation::Intersection => pathbool::intersection(&p1, &p2, opts),
            Operation::Difference => pathbool::difference(&p1, &p2, opts),
            Operation::RemoveCrossings => pathbool::remove_crossings(&p1, opts),
        })
    }
}

fn main() {
    let args = Arguments::from_args();
    let tests = regression_tests();

    libtest_mimic::run(&args, tests).exit();
}

fn regression_tests() -> Vec<Trial> {
    let ws = env!("CARGO_MANIFEST_DIR");
    let file_paths = glob::glob(&format!("{ws}/tests/regression/**/*.yml")).unwrap();

    file_paths
        .into_iter()
        .map(|p| {
            let p = p.unwrap();
            let name = input_path_base(&p).display().to_string();
            Trial::test(name, || generate_regression_test(p))
        })
        .collect()
}

fn input_path_base(input_path: &FsPath) -> &FsPath {
    let base = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/regression");
    input_path.strip_prefix(base).unwrap_or(input_path)
}

fn generate_regression_test(path: PathBuf) -> Result<(), Failed> {
    let input = std::fs::read_to_string(&path)?;
    let case: RegressionCaseDeclaration = serde_yaml::from_str(&input)?;
    let output = case.run()?;

    for assertion in &case.assert {
        check(assertion, &output)?;
    }
    Ok(())
}

fn check(assertion: &Assertion, output: &BooleanOutput) -> Result<(), Failed> {
    match *assertion {
        Assertion::NoPanic => {}
        Assertion::Clean => {
            if !output.is_clean() {
                return Err(format!("unexpected diagnostics: {:?}", output.diagnostics).into());
            }
        }
        Assertion::Components(n) => {
            let found = output.path.components().len();
            if found != n {
                return Err(format!(
                    "expected {n} components, found {found}: {}",
                    output.path.to_svg()
                )
                .into());
            }
        }
        Assertion::Area {
            expected,
            tolerance,
        } => {
            let area = output.path.area();
            if (area - expected).abs() > tolerance {
                return Err(format!("expected area {expected}, found {area}").into());
            }
        }
        Assertion::Winding {
            point: (x, y),
            expected,
        } => {
            let winding = output.path.winding_count(Point::new(x, y));
            if winding != expected {
                return Err(format!("expected winding {expected} at ({x}, {y}), found {winding}").into());
            }
        }
    }
    Ok(())
}
