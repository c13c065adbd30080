#![no_std]
#![no_main]

mod clock;
mod config;
mod http_server;
mod relay;
mod utils;

use clock::sntp_task;
use config::{HOSTNAME, PASSWORD, SSID};
use embassy_executor::Spawner;
use embassy_net::{Config, DhcpConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};
use esp_backtrace as _;
use esp_hal::{
    clock::ClockControl,
    gpio::{Io, Level, OutputOpenDrain, Pull},
    peripherals::Peripherals,
    riscv::singleton,
    rng::Rng,
    system::SystemControl,
    timer::{systimer::SystemTimer, timg::TimerGroup},
};
use esp_wifi::{
    initialize,
    wifi::{
        ClientConfiguration, Configuration, WifiController, WifiDevice, WifiEvent, WifiStaDevice,
        WifiState,
    },
    EspWifiInitFor,
};
use garagesp::pages::{COMPILE_DATE, VERSION};
use http_server::http_server_task;
use relay::install_relay;

/// The network stack shared by every task.
pub type WifiStack = Stack<WifiDevice<'static, WifiStaDevice>>;

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    esp_println::logger::init_logger_from_env();
    log::info!("SYS | garagesp {} built {}", VERSION, COMPILE_DATE);

    // Initialize the peripherals
    let peripherals = Peripherals::take();
    let system = SystemControl::new(peripherals.SYSTEM);
    let clocks = ClockControl::max(system.clock_control).freeze();
    let mut rng = Rng::new(peripherals.RNG);

    // Release the relay before anything else can happen
    let io = Io::new(peripherals.GPIO, peripherals.IO_MUX);
    install_relay(OutputOpenDrain::new(io.pins.gpio2, Level::High, Pull::None));

    // Generate a seed for the wifi stack
    let mut seed_buf = [0u8; 8];
    rng.read(&mut seed_buf);
    let seed: u64 = u64::from_ne_bytes(seed_buf);

    // Initialize the wifi
    let timer = SystemTimer::new(peripherals.SYSTIMER).alarm0;
    let init = initialize(
        EspWifiInitFor::Wifi,
        timer,
        rng,
        peripherals.RADIO_CLK,
        &clocks,
    )
    .expect("SYS | Could not initialize the wifi driver");

    // Set wifi mode
    let (wifi_interface, controller) =
        esp_wifi::wifi::new_with_mode(&init, peripherals.WIFI, WifiStaDevice)
            .expect("SYS | Could not set the wifi in station mode");

    // Configure DHCPv4
    let mut dhcp_config = DhcpConfig::default();
    dhcp_config.hostname = heapless::String::try_from(HOSTNAME).ok();
    let config = Config::dhcpv4(dhcp_config);

    // Create the wifi stack
    let stack = &*singleton!(:WifiStack = Stack::new(
        wifi_interface,
        config,
        singleton!(:StackResources<6> = StackResources::new())
            .expect("SYS | Stack resources already taken"),
        seed
    ))
    .expect("SYS | Stack already taken");

    // Initialize embassy for async tasks
    let timg0 = TimerGroup::new_async(peripherals.TIMG0, &clocks);
    esp_hal_embassy::init(&clocks, timg0);

    spawner.spawn(connection(controller)).ok();
    spawner.spawn(net_task(stack)).ok();
    spawner.spawn(sntp_task(stack)).ok();
    spawner.spawn(http_server_task(stack)).ok();
}

#[embassy_executor::task]
async fn connection(mut controller: WifiController<'static>) {
    log::info!("SYS | Start connection task");
    log::info!(
        "SYS | Device capabilities: {:?}",
        controller.get_capabilities()
    );

    let (Ok(ssid), Ok(password)) = (
        heapless::String::<32>::try_from(SSID),
        heapless::String::<64>::try_from(PASSWORD),
    ) else {
        log::error!("SYS | SSID or PASSWORD is too long, wifi disabled");
        return;
    };
    let client_config = Configuration::Client(ClientConfiguration {
        ssid,
        password,
        ..Default::default()
    });

    loop {
        if esp_wifi::wifi::get_wifi_state() == WifiState::StaConnected {
            // Wait until we're no longer connected
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            log::warn!("SYS | Wifi disconnected");
            Timer::after(Duration::from_millis(5000)).await
        }

        if !matches!(controller.is_started(), Ok(true)) {
            if let Err(e) = controller.set_configuration(&client_config) {
                log::error!("SYS | Could not configure wifi: {:?}", e);
                Timer::after(Duration::from_millis(5000)).await;
                continue;
            }
            log::info!("SYS | Starting wifi...");
            if let Err(e) = controller.start().await {
                log::error!("SYS | Could not start wifi: {:?}", e);
                Timer::after(Duration::from_millis(5000)).await;
                continue;
            }
            log::info!("SYS | Wifi started!");
        }
        log::info!("SYS | About to connect to {}...", SSID);

        match controller.connect().await {
            Ok(_) => log::info!("SYS | Wifi connected!"),
            Err(e) => {
                log::warn!("SYS | Failed to connect to wifi: {e:?}");
                Timer::after(Duration::from_millis(5000)).await
            }
        }
    }
}

#[embassy_executor::task]
async fn net_task(stack: &'static WifiStack) {
    stack.run().await
}
