//! Input source aggregation
//!
//! Keyboard, the on-screen touch pad, and a gamepad each keep independent
//! boolean state per control; the merged view is the per-control logical OR.
//! Resetting one source (window blur, gamepad disconnect) never disturbs the
//! others. Analog gamepad values are thresholded into booleans here so the
//! simulation only ever sees `DriveInput`.

/// Logical control state for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriveInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub restart: bool,
}

impl DriveInput {
    /// Per-control logical OR of two sources
    pub fn merge(self, other: DriveInput) -> DriveInput {
        DriveInput {
            forward: self.forward || other.forward,
            backward: self.backward || other.backward,
            left: self.left || other.left,
            right: self.right || other.right,
            restart: self.restart || other.restart,
        }
    }
}

/// One logical control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveControl {
    Forward,
    Backward,
    Left,
    Right,
    Restart,
}

impl DriveInput {
    fn set(&mut self, control: DriveControl, active: bool) {
        match control {
            DriveControl::Forward => self.forward = active,
            DriveControl::Backward => self.backward = active,
            DriveControl::Left => self.left = active,
            DriveControl::Right => self.right = active,
            DriveControl::Restart => self.restart = active,
        }
    }
}

/// Map a browser `KeyboardEvent.code` to a control
pub fn key_code_to_control(code: &str) -> Option<DriveControl> {
    match code {
        "ArrowUp" | "KeyW" => Some(DriveControl::Forward),
        "ArrowDown" | "KeyS" => Some(DriveControl::Backward),
        "ArrowLeft" | "KeyA" => Some(DriveControl::Left),
        "ArrowRight" | "KeyD" => Some(DriveControl::Right),
        "Space" | "KeyR" => Some(DriveControl::Restart),
        _ => None,
    }
}

/// Stick deflection that counts as a steer press
pub const STICK_STEER_THRESHOLD: f32 = 0.28;
/// Stick deflection that counts as a drive press
pub const STICK_DRIVE_THRESHOLD: f32 = 0.32;
/// Trigger travel that counts as a press
pub const TRIGGER_THRESHOLD: f32 = 0.16;

/// Raw gamepad sample supplied by the platform layer each frame
#[derive(Debug, Clone, Copy, Default)]
pub struct GamepadReading {
    /// Left stick, -1 (left) .. 1 (right)
    pub stick_x: f32,
    /// Left stick, -1 (up) .. 1 (down)
    pub stick_y: f32,
    /// Right trigger travel, 0..1
    pub throttle: f32,
    /// Left trigger travel, 0..1
    pub brake: f32,
    pub dpad_up: bool,
    pub dpad_down: bool,
    pub dpad_left: bool,
    pub dpad_right: bool,
    /// South face button (cross / A)
    pub south: bool,
    /// Start / options button
    pub start: bool,
}

/// Merges keyboard, virtual touch, and gamepad state into one control vector
#[derive(Debug, Clone, Default)]
pub struct InputAggregator {
    keyboard: DriveInput,
    virtual_pad: DriveInput,
    gamepad: DriveInput,
    gamepad_connected: bool,
}

impl InputAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a keyboard event. Returns true if the code mapped to a control.
    pub fn apply_key(&mut self, code: &str, pressed: bool) -> bool {
        match key_code_to_control(code) {
            Some(control) => {
                self.keyboard.set(control, pressed);
                true
            }
            None => false,
        }
    }

    /// Clear keyboard state (window blur drops key-up events)
    pub fn reset_keyboard(&mut self) {
        self.keyboard = DriveInput::default();
    }

    /// Apply a virtual touch button state change
    pub fn set_virtual(&mut self, control: DriveControl, active: bool) {
        self.virtual_pad.set(control, active);
    }

    pub fn reset_virtual(&mut self) {
        self.virtual_pad = DriveInput::default();
    }

    /// Threshold an analog gamepad sample into this tick's gamepad state
    pub fn apply_gamepad(&mut self, pad: &GamepadReading) {
        self.gamepad_connected = true;
        self.gamepad = DriveInput {
            forward: pad.throttle > TRIGGER_THRESHOLD
                || pad.stick_y < -STICK_DRIVE_THRESHOLD
                || pad.dpad_up,
            backward: pad.brake > TRIGGER_THRESHOLD
                || pad.stick_y > STICK_DRIVE_THRESHOLD
                || pad.dpad_down,
            left: pad.stick_x < -STICK_STEER_THRESHOLD || pad.dpad_left,
            right: pad.stick_x > STICK_STEER_THRESHOLD || pad.dpad_right,
            restart: pad.south || pad.start,
        };
    }

    /// Drop gamepad contribution (disconnect, or no pad polled this frame)
    pub fn reset_gamepad(&mut self) {
        self.gamepad = DriveInput::default();
        self.gamepad_connected = false;
    }

    pub fn gamepad_connected(&self) -> bool {
        self.gamepad_connected
    }

    /// The control vector the simulation samples once per tick
    pub fn merged(&self) -> DriveInput {
        self.keyboard.merge(self.virtual_pad).merge(self.gamepad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sources_or_together() {
        let mut agg = InputAggregator::new();
        agg.apply_key("KeyW", true);
        agg.set_virtual(DriveControl::Left, true);
        let merged = agg.merged();
        assert!(merged.forward);
        assert!(merged.left);
        assert!(!merged.backward);
    }

    #[test]
    fn test_reset_clears_only_one_source() {
        let mut agg = InputAggregator::new();
        agg.apply_key("ArrowUp", true);
        agg.set_virtual(DriveControl::Forward, true);
        agg.reset_keyboard();
        // virtual pad still holds the control
        assert!(agg.merged().forward);
        agg.reset_virtual();
        assert!(!agg.merged().forward);
    }

    #[test]
    fn test_gamepad_thresholds() {
        let mut agg = InputAggregator::new();

        // below threshold: no press
        agg.apply_gamepad(&GamepadReading {
            stick_x: 0.2,
            throttle: 0.1,
            ..Default::default()
        });
        assert_eq!(agg.merged(), DriveInput::default());

        // above threshold: steer right + throttle
        agg.apply_gamepad(&GamepadReading {
            stick_x: 0.5,
            throttle: 0.4,
            ..Default::default()
        });
        let merged = agg.merged();
        assert!(merged.right && merged.forward);

        agg.reset_gamepad();
        assert_eq!(agg.merged(), DriveInput::default());
        assert!(!agg.gamepad_connected());
    }

    #[test]
    fn test_dpad_and_buttons() {
        let mut agg = InputAggregator::new();
        agg.apply_gamepad(&GamepadReading {
            dpad_down: true,
            start: true,
            ..Default::default()
        });
        let merged = agg.merged();
        assert!(merged.backward && merged.restart);
    }

    #[test]
    fn test_unknown_key_ignored() {
        let mut agg = InputAggregator::new();
        assert!(!agg.apply_key("KeyQ", true));
        assert_eq!(agg.merged(), DriveInput::default());
    }
}
