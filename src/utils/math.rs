// https://www.johndcook.com/blog/standard_deviation/
/// Streaming mean and standard deviation over a sequence of samples.
pub struct Stats {
    mean: f64,
    sum_sq: f64,
    count: f64,
}

impl Stats {
    pub fn new() -> Self {
        Self {
            mean: 0.0,
            sum_sq: 0.0,
            count: 0.0,
        }
    }

    pub fn add(&mut self, value: impl Into<f64>) {
        let value = value.into();
        self.count += 1.0;
        let delta = value - self.mean;
        self.mean += delta / self.count;
        self.sum_sq += delta * (value - self.mean);
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Population standard deviation. Zero when fewer than two samples.
    pub fn std_dev(&self) -> f64 {
        if self.count <= 1.0 {
            return 0.0;
        }
        (self.sum_sq / self.count).sqrt()
    }

    pub fn count(&self) -> usize {
        self.count as usize
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Into<f64>> Extend<A> for Stats {
    fn extend<T: IntoIterator<Item = A>>(&mut self, iter: T) {
        iter.into_iter().for_each(|a| self.add(a))
    }
}

/// Arithmetic mean of a slice, zero when empty.
pub fn mean_of(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod test {
    use super::*;

    fn float_cmp(a: f64, b: f64) -> bool {
        (a - b).abs() <= 0.01
    }

    #[test]
    fn running_mean() {
        let mut stats = Stats::new();
        assert_eq!(0.0, stats.mean());

        stats.add(1);
        assert!(float_cmp(1.0, stats.mean()));

        stats.add(2);
        assert!(float_cmp(1.5, stats.mean()));

        stats.add(3);
        assert!(float_cmp(2.0, stats.mean()));
        assert_eq!(3, stats.count());
    }

    #[test]
    fn running_std_dev() {
        let mut stats = Stats::new();
        assert_eq!(0.0, stats.std_dev());

        stats.extend(vec![2, 2, 2, 2]);
        assert!(float_cmp(0.0, stats.std_dev()));

        let mut stats = Stats::new();
        stats.extend(vec![0, 0, 255, 255]);
        assert!(float_cmp(127.5, stats.mean()));
        assert!(float_cmp(127.5, stats.std_dev()));
    }

    #[test]
    fn slice_mean() {
        assert_eq!(0.0, mean_of(&[]));
        assert!(float_cmp(0.5, mean_of(&[0.0, 1.0])));
    }
}
