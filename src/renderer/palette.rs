//! Colors and glyphs used by the scene

/// Linear RGBA, each channel 0-1
pub type Rgba = [f32; 4];

/// Opaque color from a 0xRRGGBB literal
pub const fn hex(rgb: u32) -> Rgba {
    [
        ((rgb >> 16) & 0xff) as f32 / 255.0,
        ((rgb >> 8) & 0xff) as f32 / 255.0,
        (rgb & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Same color with its alpha scaled by `alpha`
#[inline]
pub fn fade(color: Rgba, alpha: f32) -> Rgba {
    [color[0], color[1], color[2], color[3] * alpha.clamp(0.0, 1.0)]
}

/// CSS `rgba()` string for canvas backends
pub fn css(color: Rgba) -> String {
    format!(
        "rgba({}, {}, {}, {:.3})",
        (color[0] * 255.0).round() as u8,
        (color[1] * 255.0).round() as u8,
        (color[2] * 255.0).round() as u8,
        color[3]
    )
}

pub const WHITE: Rgba = hex(0xffffff);
pub const BLACK: Rgba = hex(0x000000);
pub const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];

pub const BACKGROUND: Rgba = hex(0x1a1a2e);
pub const WALL: Rgba = hex(0x4a5568);
pub const OBSTACLE: Rgba = hex(0xcbd5e0);
pub const OBSTACLE_GLOW: Rgba = [203.0 / 255.0, 213.0 / 255.0, 224.0 / 255.0, 0.5];

// Player snake
pub const SNAKE_HEAD: Rgba = hex(0x48bb78);
pub const SNAKE_BODY: Rgba = hex(0x68d391);

// Opponent snake
pub const AI_HEAD: Rgba = hex(0x9f7aea);
pub const AI_BODY: Rgba = hex(0xb794f4);
pub const AI_HEAD_STUNNED: Rgba = hex(0x718096);
pub const AI_BODY_STUNNED: Rgba = hex(0xa0aec0);
pub const AI_EYE_STUNNED: Rgba = hex(0x4a5568);
pub const AI_PUPIL: Rgba = hex(0xe53e3e);

// Fireballs
pub const FIREBALL: Rgba = hex(0xff6600);
pub const FIREBALL_GLOW: Rgba = hex(0xff4d00);
pub const FIREBALL_CORE: Rgba = hex(0xffcc00);

// Countdown ring
pub const RING_TRACK: Rgba = [1.0, 1.0, 1.0, 0.15];
pub const RING_PROGRESS: Rgba = [1.0, 1.0, 1.0, 0.8];

/// Explosion radial gradient stops (offset, color)
pub const EXPLOSION_STOPS: [(f32, Rgba); 4] = [
    (0.0, WHITE),
    (0.3, hex(0xffff00)),
    (0.7, hex(0xff4400)),
    (1.0, TRANSPARENT),
];

pub const CONFETTI: [Rgba; 6] = [
    hex(0xf56565),
    hex(0xed8936),
    hex(0xecc94b),
    hex(0x48bb78),
    hex(0x4299e1),
    hex(0x9f7aea),
];

/// Food glyph by type
pub fn food_glyph(food_type: u8) -> &'static str {
    match food_type {
        1 => "🔵",
        2 => "🟠",
        3 => "🔴",
        _ => "🟣",
    }
}

/// Accent color matching the food glyph (score labels)
pub fn food_color(food_type: u8) -> Rgba {
    match food_type {
        1 => hex(0x63b3ed),
        2 => hex(0xf6ad55),
        3 => hex(0xfc8181),
        _ => hex(0xb794f4),
    }
}

pub const CRASH_GLYPH: &str = "💥";
