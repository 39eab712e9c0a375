// ServeSense - Firmware Entry Point
//
// Boot sequence:
//   1. Startup pulse on the vibration motor and LED.
//   2. Bring up the ICM-20600 (fatal on failure).
//   3. Load and verify the model (fatal on failure).
//   4. Spawn the console (command input) and heartbeat tasks.
//   5. Run the control loop on the main task forever.
//
// Fatal init failures park the firmware until it is reset.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("servesense runs on the Xiao ESP32-S3; build with --target xtensa-esp32s3-espidf");
    std::process::exit(1);
}

#[cfg(target_os = "espidf")]
mod firmware {
    use std::thread;
    use std::time::{Duration, Instant};

    use esp_idf_hal::gpio::{AnyInputPin, InputPin, OutputPin, PinDriver};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use servesense::config::*;
    use servesense::controller::Controller;
    use servesense::drivers::haptic::HapticDriver;
    use servesense::drivers::imu::Icm20600;
    use servesense::drivers::led::StatusLed;
    use servesense::drivers::BoardOutputs;
    use servesense::feedback;
    use servesense::model::verify_engine;
    use servesense::tasks;
    use servesense::telemetry::SerialTelemetry;

    pub fn run() -> anyhow::Result<()> {
        // Link esp-idf-sys runtime patches and initialise logging.
        esp_idf_svc::sys::link_patches();
        esp_idf_svc::log::EspLogger::initialize_default();
        log::info!("=== ServeSense Classifier ===");

        let config = if cfg!(feature = "button-capture") {
            PipelineConfig::button()
        } else {
            PipelineConfig::default()
        };

        // ---- Peripherals ------------------------------------------------------
        let peripherals = Peripherals::take()?;

        let mut outputs = BoardOutputs {
            haptic: HapticDriver::new(PinDriver::output(peripherals.pins.gpio1.downgrade_output())?),
            led: StatusLed::new(PinDriver::output(peripherals.pins.gpio21.downgrade_output())?, true),
        };
        feedback::play(&mut outputs, feedback::STARTUP);

        let input_pin: AnyInputPin = match config.input_mode {
            InputMode::ToggleSwitch => peripherals.pins.gpio2.downgrade_input(),
            InputMode::PushButton => peripherals.pins.gpio0.downgrade_input(),
        };
        let input = PinDriver::input(input_pin)?;
        configure_pullup(config.input_pin());

        // ---- IMU ------------------------------------------------------------
        let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_HZ.Hz().into());
        let i2c = I2cDriver::new(
            peripherals.i2c0,
            peripherals.pins.gpio5, // SDA
            peripherals.pins.gpio6, // SCL
            &i2c_config,
        )?;
        let mut imu = Icm20600::new(i2c);
        if let Err(e) = imu.init() {
            halt("IMU initialization failed", e);
        }

        // ---- Model ----------------------------------------------------------
        #[cfg(feature = "tflite-micro")]
        let engine = match servesense::model::TfliteEngine::new() {
            Ok(engine) => engine,
            Err(e) => halt("Model initialization failed", e),
        };
        #[cfg(not(feature = "tflite-micro"))]
        let engine = servesense::model::StubEngine::default();

        if let Err(e) = verify_engine(&engine) {
            halt("Model verification failed", e);
        }

        // ---- Controller & tasks ----------------------------------------------
        let controller = Controller::new(
            config,
            imu,
            engine,
            outputs,
            SerialTelemetry::new(std::io::stdout()),
            input.is_high(),
            Instant::now(),
        );

        let console_tx = controller.event_sender();
        thread::Builder::new()
            .name("console".into())
            .stack_size(STACK_CONSOLE)
            .spawn(move || {
                tasks::console::console_task(std::io::stdin(), console_tx);
            })?;

        let flag = controller.capture_flag();
        thread::Builder::new()
            .name("heartbeat".into())
            .stack_size(STACK_HEARTBEAT)
            .spawn(move || {
                tasks::heartbeat::heartbeat_task(flag);
            })?;

        tasks::control::control_task(controller, move || input.is_high())
    }

    /// Enable the internal pull-up on an input pin.  The downgraded
    /// `AnyInputPin` driver has no `set_pull`, so go through the raw API.
    fn configure_pullup(pin: i32) {
        unsafe {
            esp_idf_sys::gpio_set_pull_mode(pin, esp_idf_sys::gpio_pull_mode_t_GPIO_PULLUP_ONLY);
        }
    }

    /// Park the firmware after a fatal init failure.  Needs a reset.
    fn halt(what: &str, err: anyhow::Error) -> ! {
        log::error!("ERROR: {}: {:#}", what, err);
        loop {
            thread::sleep(Duration::from_millis(HALT_POLL_MS));
        }
    }
}
