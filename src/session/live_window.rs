use crate::metrics::Sample;
use std::collections::VecDeque;

/// Bounded recent history per channel, feeding real-time display.
///
/// Every push writes all channels at once and evicts the oldest entry of
/// every channel together, so the channels always have equal length.
#[derive(Debug, Clone)]
pub struct LiveWindow {
    capacity: usize,
    fps_cap: f64,
    timestamps: VecDeque<f64>,
    cpu_percent: VecDeque<f64>,
    ram_gb: VecDeque<f64>,
    gpu_percent: VecDeque<f64>,
    vram_gb: VecDeque<f64>,
    fps_estimate: VecDeque<f64>,
}

impl LiveWindow {
    pub fn new(capacity: usize, fps_cap: f64) -> Self {
        Self {
            capacity,
            fps_cap,
            timestamps: VecDeque::with_capacity(capacity),
            cpu_percent: VecDeque::with_capacity(capacity),
            ram_gb: VecDeque::with_capacity(capacity),
            gpu_percent: VecDeque::with_capacity(capacity),
            vram_gb: VecDeque::with_capacity(capacity),
            fps_estimate: VecDeque::with_capacity(capacity),
        }
    }

    /// Append the display copy of `sample`, evicting the oldest if full.
    pub fn push(&mut self, sample: &Sample) {
        let shown = sample.for_display(self.fps_cap);
        let capacity = self.capacity;
        Self::push_value(&mut self.timestamps, shown.elapsed_seconds, capacity);
        Self::push_value(&mut self.cpu_percent, shown.cpu_percent, capacity);
        Self::push_value(&mut self.ram_gb, shown.ram_gb, capacity);
        Self::push_value(&mut self.gpu_percent, shown.gpu_percent, capacity);
        Self::push_value(&mut self.vram_gb, shown.vram_gb, capacity);
        Self::push_value(&mut self.fps_estimate, shown.fps_estimate, capacity);
    }

    fn push_value(queue: &mut VecDeque<f64>, value: f64, capacity: usize) {
        if queue.len() >= capacity {
            queue.pop_front();
        }
        queue.push_back(value);
    }

    pub fn clear(&mut self) {
        self.timestamps.clear();
        self.cpu_percent.clear();
        self.ram_gb.clear();
        self.gpu_percent.clear();
        self.vram_gb.clear();
        self.fps_estimate.clear();
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent display sample, for value readouts.
    pub fn latest(&self) -> Option<Sample> {
        let last = self.len().checked_sub(1)?;
        self.get(last)
    }

    fn get(&self, index: usize) -> Option<Sample> {
        Some(Sample {
            elapsed_seconds: *self.timestamps.get(index)?,
            cpu_percent: *self.cpu_percent.get(index)?,
            ram_gb: *self.ram_gb.get(index)?,
            gpu_percent: *self.gpu_percent.get(index)?,
            vram_gb: *self.vram_gb.get(index)?,
            fps_estimate: *self.fps_estimate.get(index)?,
        })
    }

    /// Contents as whole samples, oldest first.
    pub fn samples(&self) -> Vec<Sample> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    pub fn timestamps(&self) -> &VecDeque<f64> {
        &self.timestamps
    }

    pub fn cpu_percent(&self) -> &VecDeque<f64> {
        &self.cpu_percent
    }

    pub fn ram_gb(&self) -> &VecDeque<f64> {
        &self.ram_gb
    }

    pub fn gpu_percent(&self) -> &VecDeque<f64> {
        &self.gpu_percent
    }

    pub fn vram_gb(&self) -> &VecDeque<f64> {
        &self.vram_gb
    }

    pub fn fps_estimate(&self) -> &VecDeque<f64> {
        &self.fps_estimate
    }
}

impl Default for LiveWindow {
    fn default() -> Self {
        Self::new(
            crate::DEFAULT_LIVE_WINDOW_CAPACITY,
            crate::DEFAULT_FPS_DISPLAY_CAP,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: usize) -> Sample {
        Sample::new(i as f64 * 0.5, i as f64, 2.0, 0.0, 0.0, 1.0)
    }

    #[test]
    fn test_evicts_oldest_when_full() {
        let mut window = LiveWindow::new(100, 20.0);
        for i in 0..101 {
            window.push(&sample(i));
        }

        assert_eq!(window.len(), 100);
        let samples = window.samples();
        assert_eq!(samples.first().unwrap().cpu_percent, 1.0);
        assert_eq!(samples.last().unwrap().cpu_percent, 100.0);
        assert!(samples
            .windows(2)
            .all(|pair| pair[0].elapsed_seconds < pair[1].elapsed_seconds));
    }

    #[test]
    fn test_channels_stay_aligned() {
        let mut window = LiveWindow::new(3, 20.0);
        for i in 0..7 {
            window.push(&sample(i));
        }
        assert_eq!(window.timestamps().len(), 3);
        assert_eq!(window.cpu_percent().len(), 3);
        assert_eq!(window.ram_gb().len(), 3);
        assert_eq!(window.gpu_percent().len(), 3);
        assert_eq!(window.vram_gb().len(), 3);
        assert_eq!(window.fps_estimate().len(), 3);
    }

    #[test]
    fn test_fps_is_capped_for_display() {
        let mut window = LiveWindow::new(10, 20.0);
        window.push(&Sample::new(0.0, 1.0, 1.0, 0.0, 0.0, 35.0));
        assert_eq!(window.latest().unwrap().fps_estimate, 20.0);
    }

    #[test]
    fn test_clear_and_latest() {
        let mut window = LiveWindow::default();
        assert!(window.latest().is_none());
        window.push(&sample(1));
        window.push(&sample(2));
        assert_eq!(window.latest().unwrap(), sample(2));
        window.clear();
        assert!(window.is_empty());
        assert_eq!(window.capacity(), 100);
    }
}
