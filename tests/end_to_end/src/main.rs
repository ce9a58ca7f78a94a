fn main() {
    println!("Run `cargo test -p end-to-end` to execute the loopback scenarios.");
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::io::{ErrorKind, Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    use camctl_camera::{CameraHandle, SimulatedCamera, SimulatedConfig, SimulatedProbe};
    use camctl_control::{Dispatcher, PowerAction, PowerControl, PowerError, TelecommandHandler};
    use camctl_link::{FrameWriter, LinkServer, LogSink, ServerConfig, ServerHandle};
    use camctl_protocol::{
        Command, Frame, FrameDecoder, FrameType, FunctionKind, LifecycleState, MAGIC1, MAGIC2,
        SequencerSetup, StatusReport, encode_frame,
    };

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[derive(Clone, Default)]
    struct RecordingPower(Arc<Mutex<Vec<PowerAction>>>);

    impl PowerControl for RecordingPower {
        fn request(&self, action: PowerAction) -> Result<(), PowerError> {
            self.0.lock().unwrap().push(action);
            Ok(())
        }
    }

    /// A controller listening on an OS-assigned loopback port.
    struct Controller {
        handle: ServerHandle,
        writer: FrameWriter,
        log_sink: LogSink,
        dispatcher: Arc<Mutex<Dispatcher>>,
        probe: SimulatedProbe,
        power: RecordingPower,
    }

    impl Controller {
        fn start(download_folder: &Path) -> Self {
            let camera = SimulatedCamera::new(SimulatedConfig::default());
            let probe = camera.probe();
            let power = RecordingPower::default();
            let dispatcher = Arc::new(Mutex::new(Dispatcher::new(
                CameraHandle::new(camera),
                download_folder,
                power.clone(),
            )));

            let server = LinkServer::new(ServerConfig {
                port: 0,
                ..ServerConfig::default()
            });
            let writer = server.writer();
            let log_sink = server.log_sink();
            let handle = server
                .start(TelecommandHandler::new(Arc::clone(&dispatcher)))
                .unwrap();

            Self {
                handle,
                writer,
                log_sink,
                dispatcher,
                probe,
                power,
            }
        }

        fn addr(&self) -> SocketAddr {
            SocketAddr::from(([127, 0, 0, 1], self.handle.local_addr().port()))
        }

        fn connect(&self) -> Client {
            let client = Client::connect(self.addr());
            wait_for(|| self.writer.is_client_connected());
            client
        }

        fn lifecycle(&self) -> Option<LifecycleState> {
            self.dispatcher
                .lock()
                .unwrap()
                .status()
                .map(|status| status.lifecycle)
        }
    }

    /// Minimal ground client speaking the frame protocol.
    struct Client {
        stream: TcpStream,
        decoder: FrameDecoder,
        received: VecDeque<Frame>,
    }

    impl Client {
        fn connect(addr: SocketAddr) -> Self {
            let stream = TcpStream::connect(addr).unwrap();
            stream
                .set_read_timeout(Some(Duration::from_millis(50)))
                .unwrap();
            Self {
                stream,
                decoder: FrameDecoder::new(),
                received: VecDeque::new(),
            }
        }

        fn send_raw(&mut self, bytes: &[u8]) {
            self.stream.write_all(bytes).unwrap();
        }

        fn send_telecommand(&mut self, payload: &[u8]) {
            let mut frame = Vec::new();
            encode_frame(FrameType::Telecommand.as_u8(), payload, &mut frame);
            self.send_raw(&frame);
        }

        fn send_command(&mut self, command: Command) {
            let payload = serde_json::to_vec(&command.to_json()).unwrap();
            self.send_telecommand(&payload);
        }

        /// Reads until a frame matching `wanted` arrives, discarding others.
        fn expect_frame(&mut self, wanted: impl Fn(&Frame) -> bool) -> Frame {
            let deadline = Instant::now() + TIMEOUT;
            let mut buf = [0u8; 4096];
            loop {
                while let Some(frame) = self.received.pop_front() {
                    if wanted(&frame) {
                        return frame;
                    }
                }
                assert!(Instant::now() < deadline, "no matching frame received");

                match self.stream.read(&mut buf) {
                    Ok(0) => panic!("controller closed the connection"),
                    Ok(n) => {
                        let received = &mut self.received;
                        self.decoder
                            .decode(&buf[..n], |frame| received.push_back(frame));
                    }
                    Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                    Err(e) => panic!("read failed: {e}"),
                }
            }
        }
    }

    fn wait_for(mut condition: impl FnMut() -> bool) {
        let deadline = Instant::now() + TIMEOUT;
        while !condition() {
            assert!(Instant::now() < deadline, "condition not met in time");
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn sequence_runs_and_downloads_over_the_link() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        client.send_command(Command::SequencerSetup(SequencerSetup {
            num_exposures: 3,
            exposure_time_us: 20_000,
            download: true,
        }));
        client.send_command(Command::FunctionStart);

        wait_for(|| controller.lifecycle() == Some(LifecycleState::Finished));

        let status = controller.dispatcher.lock().unwrap().status().unwrap();
        assert_eq!(status.kind, FunctionKind::Sequencer);
        assert_eq!(status.stats.exposures_count, 3);
        assert_eq!(controller.probe.shots(), 3);

        for n in 1..=3 {
            let picture = folder.path().join(format!("IMG_{n:04}.JPG"));
            assert!(picture.is_file(), "{} missing", picture.display());
        }
    }

    #[test]
    fn half_second_sequence_finishes_with_three_exposures() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        client.send_command(Command::SequencerSetup(SequencerSetup {
            num_exposures: 3,
            exposure_time_us: 500_000,
            download: false,
        }));
        client.send_command(Command::FunctionStart);

        wait_for(|| controller.lifecycle() == Some(LifecycleState::Finished));

        let status = controller.dispatcher.lock().unwrap().status().unwrap();
        assert_eq!(status.exposure_time_us, 500_000);
        assert!(!status.download_after_exposure);
        assert_eq!(status.stats.exposures_count, 3);
        assert_eq!(controller.probe.downloads(), 0);
    }

    #[test]
    fn status_telemetry_reaches_the_client() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        client.send_command(Command::SequencerSetup(SequencerSetup {
            num_exposures: -1,
            exposure_time_us: 0,
            download: false,
        }));
        wait_for(|| controller.lifecycle().is_some());

        let report = StatusReport {
            uptime_secs: 7,
            function: controller.dispatcher.lock().unwrap().status(),
        };
        controller.writer.send_json(&report).unwrap();

        let frame = client.expect_frame(|f| f.msg_type == FrameType::Telemetry.as_u8());
        let decoded: StatusReport = serde_json::from_slice(&frame.payload).unwrap();
        assert_eq!(decoded, report);
        assert_eq!(decoded.function.unwrap().programmed_exposures, -1);
    }

    #[test]
    fn log_lines_stream_to_the_client() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        let mut sink = controller.log_sink.clone();
        sink.write_all(b"INFO camctl: controller alive\n").unwrap();

        let frame = client.expect_frame(|f| f.msg_type == FrameType::Log.as_u8());
        assert_eq!(frame.payload, b"INFO camctl: controller alive\n");
    }

    #[test]
    fn data_queued_while_disconnected_reaches_next_client() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());

        controller.writer.send(FrameType::Telemetry, b"queued early");
        let mut client = controller.connect();

        let frame = client.expect_frame(|f| f.msg_type == FrameType::Telemetry.as_u8());
        assert_eq!(frame.payload, b"queued early");
    }

    #[test]
    fn malformed_input_does_not_break_the_link() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        client.send_raw(b"line noise before any frame");
        client.send_telecommand(br#"{"cmd_id":20,"num_exposures":2}"#);
        client.send_telecommand(b"not json");
        client.send_telecommand(br#"{"cmd_id":200}"#);
        client.send_command(Command::SequencerSetup(SequencerSetup {
            num_exposures: 2,
            exposure_time_us: 0,
            download: false,
        }));

        wait_for(|| controller.lifecycle() == Some(LifecycleState::Idle));
        assert!(controller.writer.is_client_connected());
    }

    #[test]
    fn partial_frame_is_dropped_when_client_leaves() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());

        let mut first = controller.connect();
        // Header announcing 255 bytes, then nothing.
        first.send_raw(&[MAGIC1, MAGIC2, FrameType::Telecommand.as_u8(), 0xff, 0x00]);
        drop(first);
        wait_for(|| !controller.writer.is_client_connected());

        let mut second = controller.connect();
        second.send_command(Command::SequencerSetup(SequencerSetup {
            num_exposures: 1,
            exposure_time_us: 0,
            download: false,
        }));
        wait_for(|| controller.lifecycle().is_some());
    }

    #[test]
    fn power_commands_are_handed_off() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        client.send_command(Command::Reboot);
        client.send_command(Command::Shutdown);

        wait_for(|| controller.power.0.lock().unwrap().len() == 2);
        assert_eq!(
            *controller.power.0.lock().unwrap(),
            vec![PowerAction::Reboot, PowerAction::Shutdown]
        );
    }

    #[test]
    fn shutdown_disconnects_the_client() {
        let folder = tempfile::tempdir().unwrap();
        let controller = Controller::start(folder.path());
        let mut client = controller.connect();

        let Controller { handle, .. } = controller;
        handle.shutdown();

        let mut buf = [0u8; 16];
        let deadline = Instant::now() + TIMEOUT;
        loop {
            match client.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    assert!(Instant::now() < deadline, "connection still open");
                }
                // A reset also means the controller closed its side.
                Err(_) => break,
            }
        }
    }
}
