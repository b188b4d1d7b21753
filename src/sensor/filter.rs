use std::collections::VecDeque;

use super::rig::SensorReading;

/// Moving-average filter over the three measured channels. Timestamp and
/// sequence id pass through untouched.
pub struct MovingAverageFilter {
    window_size: usize,
    voltage_buffer: VecDeque<f64>,
    force_buffer: VecDeque<f64>,
    temp_buffer: VecDeque<f64>,
}

impl MovingAverageFilter {
    pub fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        Self {
            window_size,
            voltage_buffer: VecDeque::with_capacity(window_size),
            force_buffer: VecDeque::with_capacity(window_size),
            temp_buffer: VecDeque::with_capacity(window_size),
        }
    }

    pub fn filter(&mut self, reading: &SensorReading) -> SensorReading {
        self.voltage_buffer.push_back(reading.voltage);
        self.force_buffer.push_back(reading.force);
        self.temp_buffer.push_back(reading.temperature);

        if self.voltage_buffer.len() > self.window_size {
            self.voltage_buffer.pop_front();
            self.force_buffer.pop_front();
            self.temp_buffer.pop_front();
        }

        SensorReading {
            voltage: mean(&self.voltage_buffer),
            force: mean(&self.force_buffer),
            temperature: mean(&self.temp_buffer),
            ..*reading
        }
    }
}

fn mean(buf: &VecDeque<f64>) -> f64 {
    buf.iter().sum::<f64>() / buf.len() as f64
}
