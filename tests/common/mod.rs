//! Builds MOD files in memory for the integration tests.
#![allow(dead_code)]

pub const RATE: u32 = 44_100;

/// One sample slot; lengths and loop points are taken from `data` and
/// given in words like on disk.
#[derive(Clone, Default)]
pub struct SampleDef {
    pub name: &'static str,
    pub data: Vec<u8>,
    pub finetune: u8,
    pub volume: u8,
    pub loop_start_words: u16,
    pub loop_length_words: u16,
}

impl SampleDef {
    pub fn one_shot(data: &[u8]) -> Self {
        Self {
            name: "one shot",
            data: data.to_vec(),
            volume: 64,
            ..Default::default()
        }
    }

    /// `len` bytes of a constant level that loop forever.
    pub fn drone(byte: u8, len: usize) -> Self {
        Self {
            name: "drone",
            data: vec![byte; len],
            volume: 64,
            loop_start_words: 0,
            loop_length_words: (len / 2) as u16,
            ..Default::default()
        }
    }
}

pub struct ModBuilder {
    tag: [u8; 4],
    channels: usize,
    title: String,
    order: Vec<u8>,
    repeat_byte: u8,
    patterns: Vec<Vec<[u8; 4]>>,
    samples: Vec<SampleDef>,
}

impl ModBuilder {
    pub fn new(tag: &[u8; 4], channels: usize) -> Self {
        Self {
            tag: *tag,
            channels,
            title: "test song".into(),
            order: vec![0],
            repeat_byte: 127,
            patterns: Vec::new(),
            samples: Vec::new(),
        }
    }

    /// Four-channel `M.K.` module.
    pub fn mk() -> Self {
        Self::new(b"M.K.", 4)
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    pub fn order(mut self, order: &[u8]) -> Self {
        self.order = order.to_vec();
        self
    }

    pub fn repeat_byte(mut self, byte: u8) -> Self {
        self.repeat_byte = byte;
        self
    }

    pub fn cell(mut self, pattern: usize, row: usize, channel: usize, bytes: [u8; 4]) -> Self {
        self.ensure_patterns(pattern + 1);
        self.patterns[pattern][row * self.channels + channel] = bytes;
        self
    }

    pub fn sample(mut self, sample: SampleDef) -> Self {
        self.samples.push(sample);
        self
    }

    fn ensure_patterns(&mut self, count: usize) {
        while self.patterns.len() < count {
            self.patterns.push(vec![[0; 4]; 64 * self.channels]);
        }
    }

    pub fn build(mut self) -> Vec<u8> {
        let pattern_count = self.order.iter().copied().max().unwrap_or(0) as usize + 1;
        self.ensure_patterns(pattern_count);

        let mut data = vec![0u8; 1084];
        let title = self.title.as_bytes();
        data[..title.len().min(20)].copy_from_slice(&title[..title.len().min(20)]);

        for (i, sample) in self.samples.iter().enumerate().take(31) {
            let header = &mut data[20 + i * 30..20 + (i + 1) * 30];
            let name = sample.name.as_bytes();
            header[..name.len().min(22)].copy_from_slice(&name[..name.len().min(22)]);
            header[22..24].copy_from_slice(&((sample.data.len() / 2) as u16).to_be_bytes());
            header[24] = sample.finetune;
            header[25] = sample.volume;
            header[26..28].copy_from_slice(&sample.loop_start_words.to_be_bytes());
            header[28..30].copy_from_slice(&sample.loop_length_words.to_be_bytes());
        }

        data[950] = self.order.len() as u8;
        data[951] = self.repeat_byte;
        data[952..952 + self.order.len()].copy_from_slice(&self.order);
        data[1080..1084].copy_from_slice(&self.tag);

        for pattern in self.patterns.iter().take(pattern_count) {
            for cell in pattern {
                data.extend_from_slice(cell);
            }
        }
        for sample in &self.samples {
            data.extend_from_slice(&sample.data[..sample.data.len() & !1]);
        }
        data
    }
}

/// Pack a cell the way it is stored on disk.
pub fn cell(period: u16, sample: u8, command: u8, param: u8) -> [u8; 4] {
    [
        (sample & 0xF0) | ((period >> 8) as u8 & 0x0F),
        period as u8,
        ((sample & 0x0F) << 4) | (command & 0x0F),
        param,
    ]
}

/// An effect-only cell.
pub fn effect(command: u8, param: u8) -> [u8; 4] {
    cell(0, 0, command, param)
}
