use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};
use kurbo::Point;
use svg::{node::element, Document};
use tracing_subscriber::EnvFilter;

use pathbool::{
    generators, BooleanOp, BooleanOptions, BooleanOutput, Classification, FillRule,
    IntersectionStrategy, Path,
};

#[derive(Copy, Clone, Debug, ValueEnum)]
enum Example {
    Checkerboard,
    SlantedCheckerboard,
    Circles,
    Pentagram,
    FigureEight,
}

#[derive(Parser)]
struct Cli {
    /// Where to write the SVG.
    #[arg(long)]
    output: PathBuf,

    #[command(flatten)]
    input: Input,

    #[arg(long)]
    non_zero: bool,

    #[arg(long)]
    accuracy: Option<f64>,

    /// Fat-line clipping precision; only used with `--fat-line`.
    #[arg(long)]
    precision: Option<f64>,

    #[arg(long)]
    fat_line: bool,

    #[arg(long)]
    sampled: bool,
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct Input {
    /// Two SVG path strings, separated by a `|`.
    paths: Option<String>,

    #[arg(long)]
    example: Option<Example>,
}

fn get_paths(input: &Input) -> anyhow::Result<(Path, Path)> {
    match (&input.paths, &input.example) {
        (Some(data), None) => {
            let (a, b) = data.split_once('|').unwrap_or((data, ""));
            Ok((Path::from_svg(a)?, Path::from_svg(b)?))
        }
        (None, Some(example)) => Ok(match example {
            Example::Checkerboard => generators::checkerboard(5),
            Example::SlantedCheckerboard => generators::slanted_checkerboard(5),
            Example::Circles => (
                generators::ring_of_circles(6, 1.5),
                generators::circle(Point::ORIGIN, 1.5),
            ),
            Example::Pentagram => (generators::star(5, 2, 2.0), Path::default()),
            Example::FigureEight => (generators::figure_eight(2.0), Path::default()),
        }),
        _ => anyhow::bail!("need either paths or an example"),
    }
}

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();
    let (shape_a, shape_b) = get_paths(&args.input)?;

    let mut options = BooleanOptions {
        fill_rule: args.non_zero.then_some(FillRule::NonZero),
        ..BooleanOptions::default()
    };
    if let Some(accuracy) = args.accuracy {
        options.accuracy = accuracy;
    }
    if let Some(precision) = args.precision {
        options.precision = precision;
    }
    if args.fat_line {
        options.strategy = IntersectionStrategy::FatLine;
    }
    if args.sampled {
        options.classification = Classification::Sampled;
    }

    let bbox = shape_a.bounding_box().union(&shape_b.bounding_box());
    if bbox.is_empty() {
        anyhow::bail!("nothing to draw");
    }
    let size = bbox.size();
    let pad = 0.05 * size.x.max(size.y);
    let one_width = size.x + 2.0 * pad;
    let one_height = size.y + 2.0 * pad;
    let stroke_width = size.x.max(size.y) / 256.0;
    let mut document = Document::new().set(
        "viewBox",
        (bbox.min.x - pad, bbox.min.y - pad, one_width * 3.0, one_height * 2.0),
    );

    for p in [&shape_a, &shape_b] {
        document = document.add(
            element::Path::new()
                .set("stroke", "black")
                .set("stroke-width", stroke_width)
                .set("opacity", 0.2)
                .set("fill", "none")
                .set("d", p.to_svg()),
        );
    }

    let results = [
        (BooleanOp::Union.apply(&shape_a, &shape_b, &options), 1.0, 0.0),
        (BooleanOp::Intersection.apply(&shape_a, &shape_b, &options), 2.0, 0.0),
        (BooleanOp::Difference.apply(&shape_a, &shape_b, &options), 0.0, 1.0),
        (BooleanOp::Difference.apply(&shape_b, &shape_a, &options), 1.0, 1.0),
        (pathbool::remove_crossings(&shape_a, &options), 2.0, 1.0),
    ];
    for (output, col, row) in results {
        document = add_output(document, &output, col * one_width, row * one_height, stroke_width);
    }

    svg::save(&args.output, &document)?;

    Ok(())
}

fn add_output(
    mut doc: Document,
    output: &BooleanOutput,
    x_off: f64,
    y_off: f64,
    stroke_width: f64,
) -> Document {
    for d in &output.diagnostics {
        tracing::warn!("{d}");
    }

    let colors = [
        "#005F73", "#0A9396", "#94D2BD", "#E9D8A6", "#EE9B00", "#CA6702", "#BB3E03", "#AE2012",
        "#9B2226",
    ];

    for (group, color) in output
        .path
        .disjoint_components()
        .iter()
        .zip(colors.iter().cycle())
    {
        let path = element::Path::new()
            .set("d", group.to_svg())
            .set("transform", format!("translate({x_off} {y_off})"))
            .set("stroke", "black")
            .set("stroke-width", stroke_width)
            .set("stroke-linejoin", "round")
            .set("fill-rule", "evenodd")
            .set("fill", *color);
        doc = doc.add(path);
    }
    doc
}
