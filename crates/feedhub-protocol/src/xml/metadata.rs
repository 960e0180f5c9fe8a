//! Static `$metadata` (EDMX) document describing the feed's entity type.

/// Served verbatim at `/$metadata`.
pub const METADATA_DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<edmx:Edmx Version="1.0" xmlns:edmx="http://schemas.microsoft.com/ado/2007/06/edmx">
    <edmx:DataServices xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata" m:DataServiceVersion="2.0">
        <Schema Namespace="MyGet" xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices" xmlns="http://schemas.microsoft.com/ado/2006/04/edm">
            <EntityType Name="V2FeedPackage" m:HasStream="true">
                <Key>
                    <PropertyRef Name="Id" />
                    <PropertyRef Name="Version" />
                </Key>
                <Property Name="Id" Type="Edm.String" Nullable="false" m:FC_TargetPath="SyndicationTitle" m:FC_ContentKind="text" m:FC_KeepInContent="false" />
                <Property Name="Version" Type="Edm.String" Nullable="false" />
                <Property Name="NormalizedVersion" Type="Edm.String" Nullable="true" />
                <Property Name="Authors" Type="Edm.String" Nullable="true" m:FC_TargetPath="SyndicationAuthorName" m:FC_ContentKind="text" m:FC_KeepInContent="false" />
                <Property Name="Copyright" Type="Edm.String" Nullable="true" />
                <Property Name="Created" Type="Edm.DateTime" Nullable="false" />
                <Property Name="Dependencies" Type="Edm.String" Nullable="true" />
                <Property Name="Description" Type="Edm.String" Nullable="true" />
                <Property Name="DownloadCount" Type="Edm.Int32" Nullable="false" />
                <Property Name="GalleryDetailsUrl" Type="Edm.String" Nullable="true" />
                <Property Name="IconUrl" Type="Edm.String" Nullable="true" />
                <Property Name="IsLatestVersion" Type="Edm.Boolean" Nullable="false" />
                <Property Name="IsAbsoluteLatestVersion" Type="Edm.Boolean" Nullable="false" />
                <Property Name="IsPrerelease" Type="Edm.Boolean" Nullable="false" />
                <Property Name="Language" Type="Edm.String" Nullable="true" />
                <Property Name="LastEdited" Type="Edm.DateTime" Nullable="true" />
                <Property Name="Published" Type="Edm.DateTime" Nullable="false" />
                <Property Name="LicenseUrl" Type="Edm.String" Nullable="true" />
                <Property Name="LicenseNames" Type="Edm.String" Nullable="true" />
                <Property Name="LicenseReportUrl" Type="Edm.String" Nullable="true" />
                <Property Name="MinClientVersion" Type="Edm.String" Nullable="true" />
                <Property Name="PackageHash" Type="Edm.String" Nullable="true" />
                <Property Name="PackageHashAlgorithm" Type="Edm.String" Nullable="true" />
                <Property Name="PackageSize" Type="Edm.Int64" Nullable="false" />
                <Property Name="ProjectUrl" Type="Edm.String" Nullable="true" />
                <Property Name="ReleaseNotes" Type="Edm.String" Nullable="true" />
                <Property Name="ReportAbuseUrl" Type="Edm.String" Nullable="true" />
                <Property Name="RequireLicenseAcceptance" Type="Edm.Boolean" Nullable="false" />
                <Property Name="Summary" Type="Edm.String" Nullable="true" m:FC_TargetPath="SyndicationSummary" m:FC_ContentKind="text" m:FC_KeepInContent="false" />
                <Property Name="Tags" Type="Edm.String" Nullable="true" />
                <Property Name="Title" Type="Edm.String" Nullable="true" />
                <Property Name="VersionDownloadCount" Type="Edm.Int32" Nullable="false" />
            </EntityType>
            <EntityContainer Name="PackagesFeed" m:IsDefaultEntityContainer="true">
                <EntitySet Name="Packages" EntityType="MyGet.V2FeedPackage" />
                <FunctionImport Name="FindPackagesById" EntitySetName="Packages" ReturnType="Collection(MyGet.V2FeedPackage)" m:HttpMethod="GET">
                    <Parameter Name="id" Type="Edm.String" FixedLength="false" Unicode="false" />
                </FunctionImport>
            </EntityContainer>
        </Schema>
    </edmx:DataServices>
</edmx:Edmx>
"#;
