use std::io::Write;

use replay::{
    codegen::{render, FullyQualified, ImportTracking},
    error::Error,
    generate_call, generate_message,
    model::{known, Member, MetadataInfo, OperationInfo, ParameterInfo, ServiceContract, TypeDef},
    summary,
    trace::{self, Sides},
};

const LOG: &str = r#"<MessageLog>
<E2ETraceEvent xmlns="http://schemas.microsoft.com/2004/06/E2ETraceEvent">
  <System xmlns="http://schemas.microsoft.com/2004/06/windows/eventlog/system">
    <TimeCreated SystemTime="2021-03-04T09:15:00Z" />
    <Source Name="System.ServiceModel.MessageLogging" />
  </System>
  <ApplicationData>
    <TraceData>
      <DataItem>
        <MessageLogTraceRecord Time="2021-03-04T10:15:00+01:00" Source="TransportSend" Type="System.ServiceModel.Channels.BufferedMessage" xmlns="http://schemas.microsoft.com/2004/06/ServiceModel/Management/MessageTrace">
          <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:a="http://www.w3.org/2005/08/addressing">
            <s:Header>
              <a:Action s:mustUnderstand="1">http://schemas.xmlsoap.org/ws/2004/09/transfer/Get</a:Action>
            </s:Header>
            <s:Body />
          </s:Envelope>
        </MessageLogTraceRecord>
      </DataItem>
    </TraceData>
  </ApplicationData>
</E2ETraceEvent>
<E2ETraceEvent xmlns="http://schemas.microsoft.com/2004/06/E2ETraceEvent">
  <System xmlns="http://schemas.microsoft.com/2004/06/windows/eventlog/system">
    <TimeCreated SystemTime="2021-03-04T09:15:01Z" />
    <Source Name="System.ServiceModel.MessageLogging" />
  </System>
  <ApplicationData>
    <TraceData>
      <DataItem>
        <MessageLogTraceRecord Time="2021-03-04T10:15:01+01:00" Source="ServiceLevelSendRequest" Type="System.ServiceModel.Dispatcher.OperationFormatter+OperationFormatterMessage" xmlns="http://schemas.microsoft.com/2004/06/ServiceModel/Management/MessageTrace">
          <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:a="http://www.w3.org/2005/08/addressing">
            <s:Header>
              <a:Action s:mustUnderstand="1">http://tempuri.org/ICalculator/Add</a:Action>
            </s:Header>
            <s:Body>
              <Add xmlns="http://tempuri.org/">
                <request xmlns:i="http://www.w3.org/2001/XMLSchema-instance">
                  <A>10</A>
                  <B>5</B>
                </request>
              </Add>
            </s:Body>
          </s:Envelope>
        </MessageLogTraceRecord>
      </DataItem>
    </TraceData>
  </ApplicationData>
</E2ETraceEvent>
</MessageLog>
"#;

fn calculator() -> ServiceContract {
    let add_request = TypeDef::class("Calculator", "AddRequest")
        .with_members(vec![
            Member::new("A", known::int32()),
            Member::new("B", known::int32()),
        ])
        .into_ref();

    ServiceContract::new("http://tempuri.org/", "ICalculator")
        .with_operation(
            OperationInfo::new("Add").with_parameter(ParameterInfo::new("request", add_request)),
        )
        .with_operation(
            OperationInfo::new("Clear").with_parameter(ParameterInfo::out("previous", known::int32())),
        )
}

#[test]
fn add_request_is_reproduced() {
    let messages = trace::parse_requests(LOG, Sides::Both).unwrap();
    assert_eq!(messages.len(), 1);

    let contract = calculator();
    let mut resolver = ImportTracking::new();
    let unit = generate_message(&messages[0], &contract, &MetadataInfo, &mut resolver).unwrap();

    assert_eq!(unit.imports, vec!["Calculator".to_owned()]);

    let code = render(&unit);
    assert!(code.starts_with("using Calculator;\n\n// 2021-03-04T10:15:01+01:00 http://tempuri.org/ICalculator/Add\n"));
    assert!(code.ends_with(
        "AddRequest request = new AddRequest();\n\
         request.A = 10;\n\
         request.B = 5;\n"
    ));
}

#[test]
fn read_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(LOG.as_bytes()).unwrap();

    let messages: Vec<_> = trace::open(file.path(), Sides::Client)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();

    assert_eq!(messages.len(), 1);
    assert_eq!(
        summary(&messages[0]),
        "2021-03-04T10:15:01+01:00 [client] http://tempuri.org/ICalculator/Add"
    );
}

#[test]
fn out_parameters_have_no_value() {
    let messages = trace::parse_requests(LOG, Sides::Both).unwrap();
    let contract = calculator();
    let clear = &contract.operations[1];

    let mut resolver = FullyQualified;
    let unit = generate_call(&messages[0], clear, &MetadataInfo, &mut resolver).unwrap();

    assert!(unit.imports.is_empty());
    assert!(render(&unit).ends_with("\nint previous;\n"));
}

#[test]
fn unknown_actions_are_reported() {
    let messages = trace::parse_requests(LOG, Sides::Both).unwrap();
    let contract = ServiceContract::new("http://tempuri.org/", "IOther");

    let mut resolver = FullyQualified;
    let error = generate_message(&messages[0], &contract, &MetadataInfo, &mut resolver).unwrap_err();

    assert!(matches!(error, Error::UnknownOperation(ref action) if action == "http://tempuri.org/ICalculator/Add"));
    assert!(error.is_user_error());
}

#[test]
fn service_side_reader_skips_client_captures() {
    assert!(trace::parse_requests(LOG, Sides::Service).unwrap().is_empty());
}

#[test]
fn trace_files_are_rejected() {
    let error = trace::parse_requests(
        r#"<E2ETraceEvent xmlns="http://schemas.microsoft.com/2004/06/E2ETraceEvent">
  <System xmlns="http://schemas.microsoft.com/2004/06/windows/eventlog/system">
    <Source Name="System.ServiceModel" />
  </System>
</E2ETraceEvent>"#,
        Sides::Both,
    )
    .unwrap_err();

    let error = Error::from(error);
    assert!(error.is_user_error());
    assert_eq!(
        error.to_string(),
        "The file in memory is a trace file, a message log file is required."
    );
}

const CONNECT: &str = r#"<E2ETraceEvent xmlns="http://schemas.microsoft.com/2004/06/E2ETraceEvent">
  <System xmlns="http://schemas.microsoft.com/2004/06/windows/eventlog/system">
    <TimeCreated SystemTime="2021-03-04T09:15:02Z" />
    <Source Name="System.ServiceModel.MessageLogging" />
  </System>
  <ApplicationData>
    <TraceData>
      <DataItem>
        <MessageLogTraceRecord Time="2021-03-04T10:15:02+01:00" Source="ServiceLevelSendRequest" Type="System.ServiceModel.Dispatcher.OperationFormatter+OperationFormatterMessage" xmlns="http://schemas.microsoft.com/2004/06/ServiceModel/Management/MessageTrace">
          <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" xmlns:a="http://www.w3.org/2005/08/addressing">
            <s:Header>
              <a:Action s:mustUnderstand="1">http://tempuri.org/IDrawing/Connect</a:Action>
            </s:Header>
            <s:Body>
              <Connect xmlns="http://tempuri.org/">
                <a><Start><X>1</X></Start></a>
                <b><Start><X>2</X></Start></b>
              </Connect>
            </s:Body>
          </s:Envelope>
        </MessageLogTraceRecord>
      </DataItem>
    </TraceData>
  </ApplicationData>
</E2ETraceEvent>"#;

#[test]
fn temporaries_are_unique_across_parameters() {
    let point = TypeDef::class("Geo", "Point")
        .with_members(vec![Member::new("X", known::int32())])
        .into_ref();
    let line = TypeDef::class("Geo", "Line")
        .with_members(vec![Member::new("Start", point)])
        .into_ref();
    let contract = ServiceContract::new("http://tempuri.org/", "IDrawing").with_operation(
        OperationInfo::new("Connect")
            .with_parameter(ParameterInfo::new("a", line.clone()))
            .with_parameter(ParameterInfo::new("b", line)),
    );

    let messages = trace::parse_requests(CONNECT, Sides::Both).unwrap();
    let mut resolver = ImportTracking::new();
    let unit = generate_message(&messages[0], &contract, &MetadataInfo, &mut resolver).unwrap();
    let code = render(&unit);

    assert!(code.ends_with(
        "Line a = new Line();\n\
         Point temp0 = new Point();\n\
         temp0.X = 1;\n\
         a.Start = temp0;\n\
         Line b = new Line();\n\
         Point temp1 = new Point();\n\
         temp1.X = 2;\n\
         b.Start = temp1;\n"
    ));
}
