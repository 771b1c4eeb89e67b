use crate::infra::{load_score_request, parse_kind};
use clap::Args;
use signal_score::config::AppConfig;
use signal_score::error::AppError;
use signal_score::scoring::{
    resolve, AggregationKind, Direction, Resolution, ResolvedSignal, SignalTree,
};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON document holding `formulaType` and `signals`
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// Override the document's top-level formula
    #[arg(long, value_parser = parse_kind)]
    pub(crate) formula: Option<AggregationKind>,
    /// Print the per-signal breakdown under the score
    #[arg(long)]
    pub(crate) breakdown: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Top-level formula for the demo tree (defaults to arithmeticMean)
    #[arg(long, value_parser = parse_kind)]
    pub(crate) formula: Option<AggregationKind>,
    /// Print the per-signal breakdown after every edit
    #[arg(long)]
    pub(crate) breakdown: bool,
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    let EvaluateArgs {
        file,
        formula,
        breakdown,
    } = args;

    let request = load_score_request(&file)?;
    let kind = formula.unwrap_or(request.formula_type);
    let resolution = resolve(kind, &request.signals);

    println!("Signal tree: {}", file.display());
    render_resolution(&resolution, breakdown);
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { formula, breakdown } = args;
    let policy = AppConfig::load()?.edit_policy();

    let mut tree = SignalTree::new(formula.unwrap_or(AggregationKind::ArithmeticMean), policy);
    let first = tree.add_signal(None)?;
    tree.set_value(&first, 0.7)?;
    let second = tree.add_signal(None)?;
    tree.set_value(&second, 0.5)?;

    println!("Signal tree editing demo");
    step(&tree, "Starting tree", breakdown);

    tree.set_weight(&first, 2.5)?;
    step(&tree, "Reweight Signal 1 to 2.5", breakdown);

    tree.convert_to_formula(&second)?;
    tree.set_kind(&second, AggregationKind::ProbabilisticOr)?;
    step(&tree, "Turn Signal 2 into a probabilistic OR", breakdown);

    let nested = tree.add_signal(Some(&second))?;
    tree.rename(&nested, "Escalations")?;
    tree.set_value(&nested, 0.9)?;
    step(&tree, "Add Escalations (0.90) under Signal 2", breakdown);

    let third = tree.add_signal(None)?;
    tree.set_value(&third, 0.0)?;
    step(&tree, "Add Signal 3 at 0.00", breakdown);

    tree.set_root_kind(AggregationKind::HarmonicMean);
    step(&tree, "Switch the root to a harmonic mean", breakdown);

    tree.move_signal(&third, Direction::Up)?;
    step(&tree, "Move Signal 3 up", breakdown);

    tree.convert_to_leaf(&second)?;
    step(&tree, "Collapse Signal 2 back into a value", breakdown);

    tree.remove(&first)?;
    step(&tree, "Remove Signal 1", breakdown);

    Ok(())
}

fn step(tree: &SignalTree, title: &str, breakdown: bool) {
    println!("\n{title}");
    render_resolution(&tree.recompute(), breakdown);
}

fn render_resolution(resolution: &Resolution, breakdown: bool) {
    println!(
        "{} score: {:.4}",
        resolution.formula_type.label(),
        resolution.score
    );

    if !breakdown {
        return;
    }
    if resolution.signals.is_empty() {
        println!("  (no signals)");
        return;
    }
    for signal in &resolution.signals {
        render_signal(signal, 1);
    }
}

fn render_signal(signal: &ResolvedSignal, depth: usize) {
    let indent = "  ".repeat(depth);
    match &signal.formula {
        Some(formula) => {
            println!(
                "{indent}- {} [{}]: {:.2} (weight {:.1}, share {:.0}%)",
                signal.name,
                formula.formula_type.label(),
                signal.value,
                signal.weight,
                signal.share * 100.0
            );
            for child in &formula.signals {
                render_signal(child, depth + 1);
            }
        }
        None => println!(
            "{indent}- {}: {:.2} (weight {:.1}, share {:.0}%)",
            signal.name,
            signal.value,
            signal.weight,
            signal.share * 100.0
        ),
    }
}
