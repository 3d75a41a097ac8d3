/// Exponentially weighted moving average with a fixed smoothing factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ewma {
    value: f64,
    alpha: f64,
}

impl Ewma {
    /// Start from `prior`, the warm-start baseline used before any sample.
    pub fn new(prior: f64, alpha: f64) -> Self {
        Self {
            value: prior,
            alpha,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value after folding `sample` in, without updating.
    pub fn peek(&self, sample: f64) -> f64 {
        (1.0 - self.alpha) * self.value + self.alpha * sample
    }

    pub fn update(&mut self, sample: f64) {
        self.value = self.peek(sample);
    }
}

/// Running mean and standard deviation from EWMAs of `x` and `x²`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EwmaMoments {
    mean: Ewma,
    mean_sq: Ewma,
}

impl EwmaMoments {
    pub fn new(prior_mean: f64, prior_mean_sq: f64, alpha: f64) -> Self {
        Self {
            mean: Ewma::new(prior_mean, alpha),
            mean_sq: Ewma::new(prior_mean_sq, alpha),
        }
    }

    pub fn mean(&self) -> f64 {
        self.mean.value()
    }

    pub fn mean_sq(&self) -> f64 {
        self.mean_sq.value()
    }

    /// sqrt(max(0, E[x²] - E[x]²))
    pub fn std_dev(&self) -> f64 {
        let m = self.mean.value();
        (self.mean_sq.value() - m * m).max(0.0).sqrt()
    }

    pub fn update(&mut self, sample: f64) {
        self.mean.update(sample);
        self.mean_sq.update(sample * sample);
    }
}
