use serialport::{SerialPortType, available_ports};
use tracing::info;

fn main() {
    tracing_subscriber::fmt::init();

    info!("Listing serial ports...");

    match available_ports() {
        Ok(ports) => {
            for (count, port) in ports.iter().enumerate() {
                info!("Port #{}: {}", count + 1, port.port_name);
                match &port.port_type {
                    SerialPortType::UsbPort(usb) => {
                        info!("  USB VID: {:#06x}, PID: {:#06x}", usb.vid, usb.pid);
                        info!(
                            "  Manufacturer: {}",
                            usb.manufacturer.as_deref().unwrap_or("<Not available>")
                        );
                        info!("  Product: {}", usb.product.as_deref().unwrap_or("<Not available>"));
                        info!(
                            "  Serial: {}",
                            usb.serial_number.as_deref().unwrap_or("<Not available>")
                        );
                    }
                    other => info!("  Type: {:?}", other),
                }
                info!("---");
            }
            if ports.is_empty() {
                info!("No serial ports found.");
            }
        }
        Err(e) => {
            eprintln!("Error listing serial ports: {:?}", e);
        }
    }
}
