use std::path::Path;

use anyhow::{Context, Result};
use ffi_lens_core::evaluation::{render_report, Evaluation};
use ffi_lens_core::labels::dataset::{
    load_ground_truth, load_predictions, write_ground_truth_subset,
};

use crate::require_file;

/// Compare predictions with ground truth over the functions both files name.
pub fn evaluate_command(
    ground_truth: &str,
    predictions: &str,
    save_subset: Option<&str>,
) -> Result<()> {
    let gt_path = Path::new(ground_truth);
    let pred_path = Path::new(predictions);
    require_file(gt_path, "Ground truth file")?;
    require_file(pred_path, "Predictions file")?;

    let truth = load_ground_truth(gt_path).context("Failed to load ground truth")?;
    println!("Loaded {} functions from ground truth: {}", truth.len(), gt_path.display());
    let preds = load_predictions(pred_path).context("Failed to load predictions")?;
    println!("Loaded {} functions with predictions: {}", preds.len(), pred_path.display());

    let evaluation = Evaluation::compute(&truth, &preds);
    println!("Functions in both predictions and ground truth: {}", evaluation.total());
    if evaluation.is_empty() {
        println!(
            "No overlapping functions between predictions and ground truth. Nothing to evaluate."
        );
        return Ok(());
    }

    if let Some(subset) = save_subset {
        let subset_path = Path::new(subset);
        let kept = write_ground_truth_subset(gt_path, subset_path, &evaluation.evaluated)
            .context("Failed to write ground truth subset")?;
        println!("Wrote {kept} rows to {}", subset_path.display());
    }

    println!();
    print!("{}", render_report(&evaluation));
    Ok(())
}
