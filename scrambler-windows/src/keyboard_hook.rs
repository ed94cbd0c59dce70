// Low-level keyboard hook
//
// Windows delivers WH_KEYBOARD_LL callbacks on the thread that installed the
// hook, and only while that thread pumps messages. The monitor therefore
// owns a dedicated thread that pumps messages until WM_QUIT arrives.
//
// The hook procedure must never unwind into the OS and must return quickly,
// otherwise Windows silently removes the hook. Every panic is caught at the
// boundary and the key is passed through.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{mpsc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, warn};
use once_cell::sync::Lazy;
use scrambler_core::engine::KeyEventHandler;
use scrambler_core::{Error, HookDecision, KeyEvent, KeyMonitor, ModifierState, MonitorHandle, Result};
use windows::Win32::{
    Foundation::*,
    System::LibraryLoader::GetModuleHandleW,
    System::Threading::GetCurrentThreadId,
    UI::Input::KeyboardAndMouse::*,
    UI::WindowsAndMessaging::*,
};

use crate::translate::{decode_translation, keyboard_state};

pub const HOOK_THREAD_NAME: &str = "scrambler-hook";

/// Handler of the installed hook. One low-level hook per process.
static HOOK_HANDLER: Lazy<Mutex<Option<KeyEventHandler>>> = Lazy::new(|| Mutex::new(None));

/// Don't change the keyboard state while translating (Windows 10 1607+)
const TO_UNICODE_NO_STATE_CHANGE: u32 = 0x4;

fn handler_slot() -> std::sync::MutexGuard<'static, Option<KeyEventHandler>> {
    match HOOK_HANDLER.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            error!("Hook handler mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Global key-down monitor backed by `WH_KEYBOARD_LL`
#[derive(Debug, Default)]
pub struct WindowsKeyMonitor;

impl WindowsKeyMonitor {
    pub fn new() -> Self {
        Self
    }
}

impl KeyMonitor for WindowsKeyMonitor {
    fn install(&self, handler: KeyEventHandler) -> Result<Box<dyn MonitorHandle>> {
        {
            let mut slot = handler_slot();
            if slot.is_some() {
                return Err(Error::Monitor("A keyboard hook is already installed".into()));
            }
            *slot = Some(handler);
        }

        let (ready_tx, ready_rx) = mpsc::channel();
        let spawned = thread::Builder::new()
            .name(HOOK_THREAD_NAME.to_string())
            .spawn(move || hook_thread(ready_tx));

        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                handler_slot().take();
                return Err(Error::Monitor(format!("Failed to spawn hook thread: {}", e)));
            }
        };

        match ready_rx.recv() {
            Ok(Ok(thread_id)) => {
                debug!("Keyboard hook installed on thread {}", thread_id);
                Ok(Box::new(WindowsHookHandle {
                    thread_id,
                    thread: Some(thread),
                }))
            }
            Ok(Err(e)) => {
                handler_slot().take();
                let _ = thread.join();
                Err(e)
            }
            Err(_) => {
                handler_slot().take();
                let _ = thread.join();
                Err(Error::Monitor("Hook thread exited during startup".into()))
            }
        }
    }
}

/// Installed hook; removing it stops the hook thread
pub struct WindowsHookHandle {
    thread_id: u32,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle for WindowsHookHandle {
    fn remove(mut self: Box<Self>) -> Result<()> {
        // Clear first so a late callback passes keys through
        handler_slot().take();

        let posted = unsafe { PostThreadMessageW(self.thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
        if let Err(e) = posted {
            return Err(Error::Monitor(format!("Failed to stop hook thread: {}", e)));
        }

        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                return Err(Error::Monitor("Hook thread panicked".into()));
            }
        }
        debug!("Keyboard hook removed");
        Ok(())
    }
}

fn hook_thread(ready: mpsc::Sender<Result<u32>>) {
    unsafe {
        // Force creation of the message queue before anyone posts WM_QUIT
        let mut msg = MSG::default();
        let _ = PeekMessageW(&mut msg, None, WM_USER, WM_USER, PM_NOREMOVE);

        let hook = match install_hook() {
            Ok(hook) => hook,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };
        let _ = ready.send(Ok(GetCurrentThreadId()));

        loop {
            let result = GetMessageW(&mut msg, None, 0, 0);
            // 0 is WM_QUIT, -1 is an error
            if result.0 <= 0 {
                if result.0 < 0 {
                    error!("Message loop failed on hook thread");
                }
                break;
            }
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }

        if let Err(e) = UnhookWindowsHookEx(hook) {
            warn!("Failed to unhook keyboard hook: {}", e);
        }
    }
}

unsafe fn install_hook() -> Result<HHOOK> {
    let module = GetModuleHandleW(None)
        .map_err(|e| Error::Monitor(format!("Failed to get module handle: {}", e)))?;

    SetWindowsHookExW(WH_KEYBOARD_LL, Some(low_level_keyboard_proc), module, 0).map_err(|e| {
        if e.code() == E_ACCESSDENIED {
            Error::PermissionDenied(format!("Keyboard hook was refused: {}", e))
        } else {
            Error::Monitor(format!("Failed to install keyboard hook: {}", e))
        }
    })
}

unsafe extern "system" fn low_level_keyboard_proc(
    ncode: i32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    let result = catch_unwind(AssertUnwindSafe(|| {
        if ncode < 0 || lparam.0 == 0 {
            return None;
        }

        let is_keydown = wparam.0 == WM_KEYDOWN as usize || wparam.0 == WM_SYSKEYDOWN as usize;
        if !is_keydown {
            return None;
        }

        let handler = handler_slot().clone()?;
        let kb_struct = unsafe { *(lparam.0 as *const KBDLLHOOKSTRUCT) };
        let event = capture_event(&kb_struct);

        let start = Instant::now();
        let decision = handler(&event);
        let elapsed = start.elapsed();
        if elapsed > Duration::from_millis(10) {
            warn!("Keyboard hook processing took {:?}, this may cause issues", elapsed);
        }
        Some(decision)
    }));

    match result {
        Ok(Some(HookDecision::Suppress)) => LRESULT(1),
        Ok(_) => CallNextHookEx(None, ncode, wparam, lparam),
        Err(e) => {
            error!("CRITICAL: Panic in keyboard hook procedure: {:?}", e);
            CallNextHookEx(None, ncode, wparam, lparam)
        }
    }
}

fn capture_event(kb_struct: &KBDLLHOOKSTRUCT) -> KeyEvent {
    let modifiers = current_modifiers();
    let injected = kb_struct.flags.0 & LLKHF_INJECTED.0 != 0;
    let characters = if injected {
        String::new()
    } else {
        translate_key(kb_struct.vkCode, kb_struct.scanCode, &modifiers)
    };

    let event = KeyEvent::new(kb_struct.vkCode as u16, modifiers, characters);
    if injected {
        event.as_injected()
    } else {
        event
    }
}

fn current_modifiers() -> ModifierState {
    unsafe {
        let down = |vk: VIRTUAL_KEY| GetAsyncKeyState(vk.0 as i32) < 0;
        ModifierState::new(
            down(VK_SHIFT),
            down(VK_CONTROL),
            down(VK_MENU),
            down(VK_LWIN) || down(VK_RWIN),
            GetKeyState(VK_CAPITAL.0 as i32) & 1 != 0,
        )
    }
}

/// Characters the key produces in the foreground window's layout
fn translate_key(vk_code: u32, scan_code: u32, modifiers: &ModifierState) -> String {
    unsafe {
        let foreground = GetForegroundWindow();
        let thread_id = GetWindowThreadProcessId(foreground, None);
        let layout = GetKeyboardLayout(thread_id);

        let state = keyboard_state(modifiers);
        let mut buffer = [0u16; 8];
        let written = ToUnicodeEx(
            vk_code,
            scan_code,
            &state,
            &mut buffer,
            TO_UNICODE_NO_STATE_CHANGE,
            layout,
        );
        decode_translation(&buffer, written)
    }
}
