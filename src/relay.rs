use core::cell::RefCell;
use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex};
use embassy_time::{Duration, Timer};
use esp_hal::gpio::{GpioPin, Level, OutputOpenDrain};

/// The relay driving the door opener's push button input.
/// It is wired active low: pulling the pin low closes the contact.
pub type RelayPin = OutputOpenDrain<'static, GpioPin<2>>;

static RELAY: Mutex<CriticalSectionRawMutex, RefCell<Option<RelayPin>>> =
    Mutex::new(RefCell::new(None));

/// Hands the relay pin over to this module.
pub fn install_relay(pin: RelayPin) {
    RELAY.lock(|relay| {
        relay.replace(Some(pin));
    });
    log::info!("RELAY | Relay installed on GPIO2");
}

/// Closes the relay for `duration`, like a push on the wall button.
pub async fn pulse_relay(duration: Duration) -> Result<(), ()> {
    set_relay(Level::Low)?;
    Timer::after(duration).await;

    if set_relay(Level::High).is_err() {
        log::error!("RELAY | Could not release the relay");
        return Err(());
    }

    log::info!("RELAY | Pulsed for {} ms", duration.as_millis());
    Ok(())
}

/// Sets the relay pin to the provided level.
fn set_relay(level: Level) -> Result<(), ()> {
    let mut triggered = false;

    RELAY.lock(|relay| {
        if let Ok(mut pin_option) = relay.try_borrow_mut() {
            if let Some(pin) = pin_option.as_mut() {
                pin.set_level(level);
                triggered = true;
            }
        }
    });

    if !triggered {
        log::error!("RELAY | Relay pin is not available");
        return Err(());
    }

    Ok(())
}
