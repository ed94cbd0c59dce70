use std::mem::size_of;

use log::debug;
use scrambler_core::{Error, KeyEvent, KeyInjector, Result};
use windows::Win32::UI::Input::KeyboardAndMouse::*;

use crate::translate::ReplayPlan;

/// Replays keys through `SendInput`.
///
/// Injected events carry `LLKHF_INJECTED`, which the hook uses to let them
/// through untouched.
#[derive(Debug, Default)]
pub struct WindowsKeyInjector;

impl WindowsKeyInjector {
    pub fn new() -> Self {
        Self
    }
}

fn keyboard_input(vk: u16, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(vk),
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn build_inputs(plan: &ReplayPlan) -> Vec<INPUT> {
    let mut inputs = Vec::with_capacity(plan.input_count());
    match plan {
        ReplayPlan::Unicode(units) => {
            for unit in units {
                inputs.push(keyboard_input(0, *unit, KEYEVENTF_UNICODE));
                inputs.push(keyboard_input(0, *unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP));
            }
        }
        ReplayPlan::VirtualKey(vk) => {
            inputs.push(keyboard_input(*vk, 0, KEYBD_EVENT_FLAGS(0)));
            inputs.push(keyboard_input(*vk, 0, KEYEVENTF_KEYUP));
        }
    }
    inputs
}

impl KeyInjector for WindowsKeyInjector {
    fn inject(&self, event: &KeyEvent) -> Result<()> {
        let Some(plan) = ReplayPlan::for_event(event) else {
            debug!("Nothing to replay for key code {:#x}", event.key_code);
            return Ok(());
        };

        let inputs = build_inputs(&plan);
        let sent = unsafe { SendInput(&inputs, size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            // Blocked by UIPI when the foreground window runs elevated
            return Err(Error::Injection(format!(
                "SendInput inserted {} of {} events: {}",
                sent,
                inputs.len(),
                windows::core::Error::from_win32()
            )));
        }
        Ok(())
    }
}
