use crate::ProviderKind;

const AWS_DOCUMENT_URL: &str = "http://169.254.169.254/latest/dynamic/instance-identity/document";
const AZURE_INSTANCE_URL: &str = "http://169.254.169.254/metadata/instance?api-version=2017-12-01";
const GCP_BASE_URL: &str = "http://metadata.google.internal/computeMetadata/v1/instance";
const GCP_CHECK_URL: &str = "http://metadata.google.internal/computeMetadata/v1/instance/id";
const OCI_INSTANCE_URL: &str = "http://169.254.169.254/opc/v1/instance/";
const ALIBABA_BASE_URL: &str = "http://100.100.100.200/latest/meta-data";
const ALIBABA_CHECK_URL: &str = "http://100.100.100.200/latest/meta-data/instance-id";

const AWS_FIELDS: &[&str] = &[
    "privateIp",
    "devpayProductCodes",
    "marketplaceProductCodes",
    "version",
    "instanceId",
    "billingProducts",
    "instanceType",
    "availabilityZone",
    "kernelId",
    "ramdiskId",
    "accountId",
    "architecture",
    "imageId",
    "pendingTime",
    "region",
];

const AZURE_FIELDS: &[&str] = &["compute", "network"];

const OCI_FIELDS: &[&str] = &[
    "id",
    "displayName",
    "compartmentId",
    "shape",
    "region",
    "availabilityDomain",
    "timeCreated",
    "image",
];

const GCP_ENTRIES: &[(&str, &str)] = &[
    ("cpu-platform", "cpu-platform"),
    ("description", "description"),
    ("hostname", "hostname"),
    ("id", "id"),
    ("machine-type", "machine-type"),
    ("name", "name"),
    ("tags", "tags"),
    ("zone", "zone"),
];

const ALIBABA_ENTRIES: &[(&str, &str)] = &[
    ("dns-conf/nameservers", "dns-conf/nameservers"),
    ("eipv4", "eipv4"),
    ("hostname", "hostname"),
    ("image-id", "image-id"),
    ("image/market-place/product-code", "image/market-place/product-code"),
    ("image/market-place/charge-type", "image/market-place/charge-type"),
    ("instance-id", "instance-id"),
    ("mac", "mac"),
    ("network-type", "network-type"),
    ("owner-account-id", "owner-account-id"),
    ("private-ipv4", "private-ipv4"),
    ("public-ipv4", "public-ipv4"),
    ("region-id", "region-id"),
    ("zone-id", "zone-id"),
    ("serial-number", "serial-number"),
    ("vpc-id", "vpc-id"),
    ("vpc-cidr-block", "vpc-cidr-block"),
    ("vswitch-cidr-block", "vswitch-cidr-block"),
    ("vswitch-id", "vswitch-id"),
    ("instance/spot/termination-time", "instance/spot/termination-time"),
    ("network/interfaces/macs", "network/interfaces/macs"),
    ("instance/virtualization-solution", "instance/virtualization-solution"),
    (
        "instance/virtualization-solution-version",
        "instance/virtualization-solution-version",
    ),
    ("instance/last-host-landing-time", "instance/last-host-landing-time"),
];

/// How a provider's metadata is fetched once the provider is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStrategy {
    /// One JSON document; the listed top-level fields are copied.
    Document {
        url: String,
        fields: Vec<&'static str>,
    },
    /// One request per `(key, sub_path)` entry under `base_url`; each body is
    /// stored as a string under `key`.
    Enumeration {
        base_url: String,
        entries: Vec<(&'static str, &'static str)>,
    },
}

/// Static description of one provider's metadata service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpec {
    pub kind: ProviderKind,
    pub check_url: String,
    pub headers: Vec<(&'static str, &'static str)>,
    pub strategy: FetchStrategy,
}

impl EndpointSpec {
    /// Full URL of an enumeration entry.
    pub fn entry_url(base_url: &str, sub_path: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), sub_path)
    }
}

/// Immutable set of provider endpoints, in detection priority order.
///
/// Built once at startup and shared by `Arc` between the prober and the
/// harvester.
#[derive(Debug, Clone)]
pub struct ProviderTable {
    specs: Vec<EndpointSpec>,
}

impl ProviderTable {
    /// The well-known metadata services of the supported providers.
    pub fn standard() -> Self {
        let specs = vec![
            EndpointSpec {
                kind: ProviderKind::Aws,
                check_url: AWS_DOCUMENT_URL.to_string(),
                headers: vec![],
                strategy: FetchStrategy::Document {
                    url: AWS_DOCUMENT_URL.to_string(),
                    fields: AWS_FIELDS.to_vec(),
                },
            },
            EndpointSpec {
                kind: ProviderKind::Azure,
                check_url: AZURE_INSTANCE_URL.to_string(),
                headers: vec![("Metadata", "true")],
                strategy: FetchStrategy::Document {
                    url: AZURE_INSTANCE_URL.to_string(),
                    fields: AZURE_FIELDS.to_vec(),
                },
            },
            EndpointSpec {
                kind: ProviderKind::Gcp,
                check_url: GCP_CHECK_URL.to_string(),
                headers: vec![("Metadata-Flavor", "Google")],
                strategy: FetchStrategy::Enumeration {
                    base_url: GCP_BASE_URL.to_string(),
                    entries: GCP_ENTRIES.to_vec(),
                },
            },
            EndpointSpec {
                kind: ProviderKind::Oci,
                check_url: OCI_INSTANCE_URL.to_string(),
                headers: vec![],
                strategy: FetchStrategy::Document {
                    url: OCI_INSTANCE_URL.to_string(),
                    fields: OCI_FIELDS.to_vec(),
                },
            },
            EndpointSpec {
                kind: ProviderKind::Alibaba,
                check_url: ALIBABA_CHECK_URL.to_string(),
                headers: vec![],
                strategy: FetchStrategy::Enumeration {
                    base_url: ALIBABA_BASE_URL.to_string(),
                    entries: ALIBABA_ENTRIES.to_vec(),
                },
            },
        ];
        Self { specs }
    }

    /// A table with custom endpoints, probed in the given order.
    pub fn from_specs(specs: Vec<EndpointSpec>) -> Self {
        Self { specs }
    }

    pub fn iter(&self) -> impl Iterator<Item = &EndpointSpec> {
        self.specs.iter()
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&EndpointSpec> {
        self.specs.iter().find(|spec| spec.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

impl Default for ProviderTable {
    fn default() -> Self {
        Self::standard()
    }
}
