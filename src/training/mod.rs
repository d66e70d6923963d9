//! Fixed-epoch training loop, prediction and the one-call entry point.
//!
//! A fit runs exactly `epochs` full-batch steps of
//! `zero grads → forward → MSE → backward → Adam step` on max-normalized
//! data. There is no early stopping and no validation split.

use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::core::{Gradients, RbfError, RbfNet, RbfResult};
use crate::data::{Normalizer, TrainingSet};
use crate::optim::{Adam, Optimizer};
use crate::Config;

/// Loss trajectory of a fit, in normalized units.
#[derive(Debug, Clone)]
pub struct TrainReport {
    /// Loss before the first update
    pub initial_loss: f32,
    /// Loss after the last update
    pub final_loss: f32,
    /// Loss seen at each epoch, before that epoch's update
    pub losses: Vec<f32>,
}

/// A trained network together with the scaling it was trained under.
#[derive(Debug, Clone)]
pub struct Fitted {
    pub model: RbfNet,
    pub normalizer: Normalizer,
    pub report: TrainReport,
}

impl Fitted {
    /// Evaluate on query inputs in original units.
    ///
    /// Inputs are scaled by `max_x`, passed forward without caching, and the
    /// outputs rescaled by `max_y`. The result has one value per query point.
    pub fn predict(&self, x_p: &[f32]) -> Vec<f32> {
        let x = self.normalizer.normalize_x(x_p);
        let y = self.model.forward(&x);
        self.normalizer.denormalize_y(&y)
    }
}

/// Train a network on `set` according to `config`.
///
/// # Errors
/// - `InvalidConfig` if `config.num_middle` is zero
#[instrument(skip_all, fields(num_middle = config.num_middle, epochs = config.epochs))]
pub fn fit(set: &TrainingSet, config: &Config) -> RbfResult<Fitted> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let normalizer = Normalizer::from_set(set);
    let x: Array1<f32> = normalizer.normalize_x(&set.x);
    let y: Array1<f32> = normalizer.normalize_y(&set.y);

    let mut model = RbfNet::new(config.num_middle, &mut rng)?;
    let mut optimizer = Adam::new(config.learning_rate);
    let mut grads = Gradients::zeros(config.num_middle);
    let mut losses = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        grads.zero();
        let cache = model.forward_cached(&x);
        let loss = RbfNet::mse(&cache.y, &y);
        model.backward(&cache, &y, &mut grads)?;
        optimizer.step(&mut model.parameters_mut(), &grads.as_array())?;
        losses.push(loss);

        if config.log_every > 0 && epoch % config.log_every == 0 {
            debug!(epoch, loss, "training");
        }
    }

    let final_loss = RbfNet::mse(&model.forward(&x), &y);
    let initial_loss = losses.first().copied().unwrap_or(final_loss);
    debug!(initial_loss, final_loss, "training finished");

    Ok(Fitted {
        model,
        normalizer,
        report: TrainReport {
            initial_loss,
            final_loss,
            losses,
        },
    })
}

/// Run `restarts` independently seeded fits in parallel and keep the one
/// with the lowest final loss.
///
/// Seeds are `seed, seed + 1, ...`; without a configured seed the base is
/// drawn at random. NaN losses rank last.
///
/// # Errors
/// - `InvalidConfig` if `restarts` is zero
/// - any error from [`fit`]
pub fn fit_best_of(set: &TrainingSet, config: &Config, restarts: usize) -> RbfResult<Fitted> {
    if restarts == 0 {
        return Err(RbfError::InvalidConfig(
            "At least one restart is required".to_string(),
        ));
    }

    let base = config.seed.unwrap_or_else(rand::random);
    let fits = (0..restarts as u64)
        .into_par_iter()
        .map(|i| {
            let run = Config {
                seed: Some(base.wrapping_add(i)),
                ..config.clone()
            };
            fit(set, &run)
        })
        .collect::<RbfResult<Vec<Fitted>>>()?;

    let rank = |f: &Fitted| {
        let loss = f.report.final_loss;
        if loss.is_nan() {
            f32::INFINITY
        } else {
            loss
        }
    };

    fits.into_iter()
        .min_by(|a, b| rank(a).total_cmp(&rank(b)))
        .ok_or_else(|| RbfError::InvalidConfig("No fits were produced".to_string()))
}

/// Fit `(x, y)` with an explicit configuration and evaluate on `x_p`.
///
/// # Errors
///
/// Returns an error if `x` and `y` differ in length, are empty, or the
/// configuration is invalid.
pub fn train_with_config(
    x: &[f32],
    y: &[f32],
    x_p: &[f32],
    config: &Config,
) -> RbfResult<Vec<f32>> {
    info!(?x, ?y, num_middle = config.num_middle, epochs = config.epochs, "training parameters");

    let set = TrainingSet::new(x.to_vec(), y.to_vec())?;
    let fitted = fit(&set, config)?;
    let y_p = fitted.predict(x_p);

    info!(?x_p, ?y_p, "predictions");
    Ok(y_p)
}

/// Fit a `num_middle`-unit RBF network to `(x, y)` for `epochs` steps and
/// return its predictions at `x_p`.
///
/// Uses the default learning rate and an entropy-seeded initialization.
pub fn train(
    x: &[f32],
    y: &[f32],
    num_middle: usize,
    epochs: usize,
    x_p: &[f32],
) -> RbfResult<Vec<f32>> {
    let config = Config {
        num_middle,
        epochs,
        ..Config::default()
    };
    train_with_config(x, y, x_p, &config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(epochs: usize) -> Config {
        Config {
            epochs,
            seed: Some(11),
            ..Config::default()
        }
    }

    #[test]
    fn test_loss_history_length() {
        let fitted = fit(&TrainingSet::demo(), &seeded(25)).unwrap();
        assert_eq!(fitted.report.losses.len(), 25);
        assert_eq!(fitted.report.initial_loss, fitted.report.losses[0]);
    }

    #[test]
    fn test_zero_epochs_keeps_initial_model() {
        let fitted = fit(&TrainingSet::demo(), &seeded(0)).unwrap();
        assert!(fitted.report.losses.is_empty());
        assert_eq!(fitted.report.initial_loss, fitted.report.final_loss);
    }

    #[test]
    fn test_loss_decreases() {
        let fitted = fit(&TrainingSet::demo(), &seeded(500)).unwrap();
        assert!(fitted.report.final_loss < fitted.report.initial_loss);
    }

    #[test]
    fn test_predict_length() {
        let fitted = fit(&TrainingSet::demo(), &seeded(10)).unwrap();
        assert_eq!(fitted.predict(&[1.0, 2.0, 3.0]).len(), 3);
        assert!(fitted.predict(&[]).is_empty());
    }

    #[test]
    fn test_zero_width_rejected() {
        let config = Config {
            num_middle: 0,
            ..seeded(10)
        };
        assert!(fit(&TrainingSet::demo(), &config).is_err());
    }

    #[test]
    fn test_train_rejects_mismatch() {
        let result = train(&[1.0, 2.0], &[1.0], 3, 10, &[0.0]);
        assert!(matches!(result, Err(RbfError::ShapeMismatch(_))));
    }

    #[test]
    fn test_best_of_not_worse_than_first() {
        let config = seeded(200);
        let single = fit(&TrainingSet::demo(), &config).unwrap();
        let best = fit_best_of(&TrainingSet::demo(), &config, 4).unwrap();
        assert!(best.report.final_loss <= single.report.final_loss);
    }

    #[test]
    fn test_best_of_zero_restarts() {
        assert!(fit_best_of(&TrainingSet::demo(), &seeded(10), 0).is_err());
    }
}
